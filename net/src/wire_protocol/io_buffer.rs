/// A fixed-size receive buffer for a single TCP connection. Incoming bytes
/// are read into [`Self::writable_part`]; once the caller has made a pass
/// over [`Self::content`] and consumed some whole number of leading bytes
/// (because they formed complete envelopes), [`Self::discard`] rotates them
/// out to make room for more.
pub struct RecvBuffer {
    buffer: [u8; 1024],
    /// Length of valid content, starting at index 0.
    mark: usize,
}

impl RecvBuffer {
    pub fn content(&self) -> &[u8] {
        &self.buffer[..self.mark]
    }

    pub fn writable_part(&mut self) -> &mut [u8] {
        &mut self.buffer[self.mark..]
    }

    /// Tells the buffer that `size` bytes were written into the slice
    /// returned by [`Self::writable_part`].
    pub fn register_added_content(&mut self, size: usize) {
        assert!(self.mark + size <= self.buffer.len());
        self.mark += size;
    }

    /// Drops `size` bytes from the front of the buffer, shifting the rest
    /// left.
    pub fn discard(&mut self, size: usize) {
        assert!(size <= self.mark);
        self.buffer.rotate_left(size);
        self.mark -= size;
    }
}

impl Default for RecvBuffer {
    fn default() -> Self {
        RecvBuffer {
            buffer: [0_u8; 1024],
            mark: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_land_after_registered_content() {
        let mut buf = RecvBuffer::default();
        buf.writable_part()[..3].copy_from_slice(b"abc");
        buf.register_added_content(3);
        assert_eq!(buf.content(), b"abc");
        buf.writable_part()[..2].copy_from_slice(b"de");
        buf.register_added_content(2);
        assert_eq!(buf.content(), b"abcde");
    }

    #[test]
    fn discard_shifts_remaining_content_to_the_front() {
        let mut buf = RecvBuffer::default();
        buf.writable_part()[..5].copy_from_slice(b"abcde");
        buf.register_added_content(5);
        buf.discard(2);
        assert_eq!(buf.content(), b"cde");
    }
}

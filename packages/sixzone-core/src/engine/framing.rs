//! Line framing for device replies.
//!
//! The amplifier ends every line with `\r\n#`. Bytes arrive in arbitrary
//! chunks, so [`LineFramer`] buffers them and hands out one line at a time.
//! Bytes after a terminator stay buffered for the next line; they are never
//! merged into the line that precedes them.

use crate::error::{TransportError, TransportResult};
use crate::protocol_constants::{LINE_TERMINATOR, MAX_LINE_BYTES};

/// Accumulates received bytes and splits them on the line terminator.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete line, without its terminator.
    ///
    /// # Errors
    /// Returns `Overflow` if more than [`MAX_LINE_BYTES`] are buffered with
    /// no terminator in sight; the buffer is cleared in that case.
    pub fn next_line(&mut self) -> TransportResult<Option<Vec<u8>>> {
        match find(&self.buf, LINE_TERMINATOR) {
            Some(end) => {
                let line = self.buf[..end].to_vec();
                self.buf.drain(..end + LINE_TERMINATOR.len());
                Ok(Some(line))
            }
            None if self.buf.len() > MAX_LINE_BYTES => {
                self.buf.clear();
                Err(TransportError::Overflow {
                    limit: MAX_LINE_BYTES,
                })
            }
            None => Ok(None),
        }
    }

    /// Bytes received since the last complete line.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_reply_into_lines() {
        let mut framer = LineFramer::new();
        framer.push(b"?13\r\r\n#>1300010000151112100301\r\n#");

        assert_eq!(framer.next_line().unwrap().unwrap(), b"?13\r");
        assert_eq!(
            framer.next_line().unwrap().unwrap(),
            b">1300010000151112100301"
        );
        assert_eq!(framer.next_line().unwrap(), None);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn waits_for_the_prompt_byte() {
        let mut framer = LineFramer::new();
        framer.push(b"<11PR01\r\r\n");
        assert_eq!(framer.next_line().unwrap(), None);

        framer.push(b"#");
        assert_eq!(framer.next_line().unwrap().unwrap(), b"<11PR01\r");
    }

    #[test]
    fn terminator_split_across_chunks() {
        let mut framer = LineFramer::new();
        for chunk in [&b"abc\r"[..], b"\n", b"#def"] {
            framer.push(chunk);
        }
        assert_eq!(framer.next_line().unwrap().unwrap(), b"abc");
        assert_eq!(framer.pending(), b"def");
    }

    #[test]
    fn surplus_bytes_are_not_merged() {
        let mut framer = LineFramer::new();
        framer.push(b"first\r\n#sec");
        assert_eq!(framer.next_line().unwrap().unwrap(), b"first");
        assert_eq!(framer.next_line().unwrap(), None);
        framer.push(b"ond\r\n#");
        assert_eq!(framer.next_line().unwrap().unwrap(), b"second");
    }

    #[test]
    fn overflow_clears_buffer() {
        let mut framer = LineFramer::new();
        framer.push(&vec![b'x'; MAX_LINE_BYTES + 1]);
        assert!(matches!(
            framer.next_line(),
            Err(TransportError::Overflow { .. })
        ));
        assert!(framer.pending().is_empty());
    }
}

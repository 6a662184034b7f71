//! Request framing.
//!
//! A request ends at the first newline outside any string once every `{` and
//! `[` opened so far has been closed, or at end-of-input when the client
//! half-closes its write side. Both styles are accepted; pretty-printed
//! requests containing newlines still work because a newline inside an open
//! object does not end the frame.
//!
//! Nesting is tracked byte by byte as data arrives, so each byte is examined
//! once no matter how the request is split into reads.

use crate::protocol::error::ProtocolError;

/// Incremental request decoder.
#[derive(Debug)]
pub struct RequestDecoder {
    buf: Vec<u8>,
    scanned: usize,
    max_bytes: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    started: bool,
}

impl RequestDecoder {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_bytes,
            depth: 0,
            in_string: false,
            escaped: false,
            started: false,
        }
    }

    /// Bytes buffered so far.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Feed bytes. Returns the frame once a complete request is buffered.
    ///
    /// The frame is handed back as soon as nesting closes; whether it is valid
    /// JSON is for the request parser to decide.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<Vec<u8>>, ProtocolError> {
        self.buf.extend_from_slice(data);

        while self.scanned < self.buf.len() {
            let pos = self.scanned;
            self.scanned += 1;

            if self.step(self.buf[pos]) {
                return Ok(Some(self.buf[..pos].to_vec()));
            }
            if pos >= self.max_bytes {
                return Err(ProtocolError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }
        Ok(None)
    }

    /// Advance the scanner by one byte. Returns true at a frame boundary.
    fn step(&mut self, byte: u8) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            return false;
        }

        match byte {
            b'\n' => return self.started && self.depth == 0,
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => self.depth = self.depth.saturating_sub(1),
            b if b.is_ascii_whitespace() => return false,
            _ => {}
        }
        self.started = true;
        false
    }

    /// End of input: whatever is buffered is the request.
    pub fn finish(self) -> Result<Vec<u8>, ProtocolError> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::Empty);
        }
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn newline_terminates_complete_document() {
        let mut decoder = RequestDecoder::new(1024);
        assert_eq!(decoder.push(br#"{"type":"li"#).unwrap(), None);
        let frame = decoder.push(b"st\"}\ntrailing").unwrap().unwrap();
        assert_eq!(frame, br#"{"type":"list"}"#.to_vec());
    }

    #[test]
    fn newlines_inside_pretty_json_do_not_split() {
        let mut decoder = RequestDecoder::new(1024);
        let pretty = b"{\n  \"type\": \"list\",\n  \"user\": {\n  }\n";
        assert_eq!(decoder.push(pretty).unwrap(), None);
        let frame = decoder.push(b"}\n").unwrap().unwrap();
        assert!(frame.ends_with(b"}"));
        assert!(serde_json::from_slice::<serde_json::Value>(&frame).is_ok());
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let mut decoder = RequestDecoder::new(1024);
        let raw = b"{\"name\":\"}\\\"{\",\"a\":[1,\n2]}\n";
        let frame = decoder.push(raw).unwrap().unwrap();
        assert_eq!(frame, raw[..raw.len() - 1].to_vec());
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let mut decoder = RequestDecoder::new(1024);
        assert_eq!(decoder.push(b"\n\n  \n").unwrap(), None);
        assert!(decoder.push(b"{}\n").unwrap().is_some());
    }

    #[test]
    fn unbalanced_garbage_is_framed_for_the_parser() {
        let mut decoder = RequestDecoder::new(1024);
        let frame = decoder.push(b"hello}}\n").unwrap().unwrap();
        assert_eq!(frame, b"hello}}".to_vec());
    }

    #[test]
    fn eof_yields_buffer() {
        let mut decoder = RequestDecoder::new(1024);
        decoder.push(br#"{"type":"list"}"#).unwrap();
        assert_eq!(decoder.finish().unwrap(), br#"{"type":"list"}"#.to_vec());

        let empty = RequestDecoder::new(1024);
        assert!(matches!(empty.finish(), Err(ProtocolError::Empty)));
    }

    #[test]
    fn enforces_size_limit() {
        let mut decoder = RequestDecoder::new(8);
        let err = decoder.push(b"0123456789").unwrap_err();
        assert!(matches!(err, ProtocolError::TooLarge { limit: 8 }));
    }

    #[test]
    fn many_line_body_scans_in_linear_time() {
        let limit = 1024 * 1024;
        let mut body = br#"{"a":[{}"#.to_vec();
        body.push(b'\n');
        while body.len() < limit - 16 {
            body.extend_from_slice(b",{}\n");
        }

        let mut decoder = RequestDecoder::new(limit);
        let start = Instant::now();
        for chunk in body.chunks(4096) {
            assert_eq!(decoder.push(chunk).unwrap(), None);
        }
        let frame = decoder.push(b"]}\n").unwrap().unwrap();

        assert_eq!(frame.len(), body.len() + 2);
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "scanning took {:?}",
            start.elapsed()
        );
    }
}

//! Incremental decoder for `text/event-stream` bodies.
//!
//! Network chunks can split a line (or a UTF-8 sequence) anywhere, so bytes
//! are buffered until a full line is available.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return the `data:` payloads of every line
    /// completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line[..line.len() - 1]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let data = line.strip_prefix(b"data:")?;
    let data = data.strip_prefix(b" ").unwrap_or(data);
    Some(String::from_utf8_lossy(data).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(out, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn payload_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"te").is_empty());
        assert!(decoder.push(b"xt\":\"hi\"}").is_empty());
        assert_eq!(decoder.push(b"\r\n\r\n"), vec!["{\"text\":\"hi\"}"]);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: caf\u{e9}\n".as_bytes();
        let split = bytes.len() - 2;
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["caf\u{e9}"]);
    }

    #[test]
    fn ignores_non_data_lines() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": keep-alive\nevent: message\nid: 7\ndata:x\n");
        assert_eq!(out, vec!["x"]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert!(decoder.finish().is_none());
    }
}

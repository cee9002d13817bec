//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive from the HTTP body in arbitrary chunks; [`SseDecoder`]
//! buffers partial lines and yields one [`SseFrame`] per blank-line
//! terminated event. Lines end with `\n` or `\r\n`.

use bytes::{Buf, BytesMut};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, `"message"` when absent.
    pub event: String,
    /// All `data:` lines joined with `\n`.
    pub data: String,
}

/// Line-buffering event-stream parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: Option<String>,
    data: String,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk, returning every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos);
            self.buf.advance(1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            // `id` and `retry` are legal but carry nothing this client uses.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".into()),
            data: std::mem::take(&mut self.data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_frame() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "put".into(),
                data: r#"{"path":"/","data":null}"#.into(),
            }]
        );
        assert!(dec.feed(b"\n").is_empty());
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"event: pa").is_empty());
        assert!(dec.feed(b"tch\ndata: {\"a\"").is_empty());
        let frames = dec.feed(b":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "patch");
        assert_eq!(frames[0].data, r#"{"a":1}"#);
    }

    #[test]
    fn crlf_line_endings() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event: keep-alive\r\ndata: null\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "keep-alive");
        assert_eq!(frames[0].data, "null");
    }

    #[test]
    fn multiple_data_lines_are_joined() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"data: first\ndata: second\n\n");
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b": heartbeat\nid: 7\nretry: 100\nevent: put\ndata: 1\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "put");
        assert_eq!(frames[0].data, "1");
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"event: put\n\n").is_empty());
        // The orphaned event name must not leak into the next frame.
        let frames = dec.feed(b"data: x\n\n");
        assert_eq!(frames[0].event, "message");
    }

    #[test]
    fn several_frames_in_one_chunk() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\nevent: c\n");
        let names: Vec<_> = frames.iter().map(|f| f.event.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        // The trailing partial frame completes on the next chunk
        let rest = dec.feed(b"data: 3\n\n");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].event, "c");
        assert_eq!(rest[0].data, "3");
    }
}

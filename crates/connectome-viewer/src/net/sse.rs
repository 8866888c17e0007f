//! Server-sent events framing for `FramedRead`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `message` when the block carried no `event:` field.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Accumulates `field: value` lines until a blank line ends the event.
#[derive(Debug, Default)]
pub struct SseCodec {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    /// Bytes of `src` already searched for a newline.
    next_index: usize,
}

impl SseCodec {
    fn take_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id,
        })
    }

    fn field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
    }
}

impl Decoder for SseCodec {
    type Item = SseEvent;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SseEvent>, Self::Error> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                return Ok(None);
            };
            let nl = self.next_index + offset;
            self.next_index = 0;
            let mut line = &src[..nl];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            let line = String::from_utf8_lossy(line).into_owned();
            src.advance(nl + 1);

            if line.is_empty() {
                if let Some(ev) = self.take_event() {
                    return Ok(Some(ev));
                }
            } else {
                self.field(&line);
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<SseEvent>, Self::Error> {
        if let Some(ev) = self.decode(src)? {
            return Ok(Some(ev));
        }
        // unterminated trailing block is discarded
        src.clear();
        self.next_index = 0;
        self.event = None;
        self.data.clear();
        self.id = None;
        Ok(None)
    }
}

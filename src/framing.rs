//! Message framing on the byte stream
//!
//! The relay protocol has no delimiter: each read chunk is taken as one
//! message. `Framing::Line` adds newline delimiting for relays that
//! support it.

/// How messages are delimited on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// One inbound chunk is one message; outbound text is sent as is
    #[default]
    Chunk,
    /// Messages are terminated by `\n`
    Line,
}

/// Encode an outbound payload (registration or chat text)
pub fn encode(framing: Framing, text: &str) -> Vec<u8> {
    match framing {
        Framing::Chunk => text.as_bytes().to_vec(),
        Framing::Line => {
            let mut bytes = Vec::with_capacity(text.len() + 1);
            bytes.extend_from_slice(text.as_bytes());
            bytes.push(b'\n');
            bytes
        }
    }
}

/// Recovers inbound messages from read chunks
#[derive(Debug, Default)]
pub struct Deframer {
    framing: Framing,
    /// Bytes of an incomplete line (line framing only)
    pending: Vec<u8>,
}

impl Deframer {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            pending: Vec::new(),
        }
    }

    /// Feed one chunk, returning every message it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        match self.framing {
            Framing::Chunk => {
                if chunk.is_empty() {
                    Vec::new()
                } else {
                    vec![String::from_utf8_lossy(chunk).into_owned()]
                }
            }
            Framing::Line => {
                self.pending.extend_from_slice(chunk);
                let mut messages = Vec::new();
                while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = self.pending.drain(..=pos).collect();
                    let line = &line[..line.len() - 1];
                    let line = line.strip_suffix(b"\r").unwrap_or(line);
                    if !line.is_empty() {
                        messages.push(String::from_utf8_lossy(line).into_owned());
                    }
                }
                messages
            }
        }
    }

    /// Bytes buffered but not yet terminated
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

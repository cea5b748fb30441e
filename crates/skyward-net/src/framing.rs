//! Length-prefixed framing.
//!
//! Each frame is a 4-byte little-endian payload length followed by the
//! payload bytes. TCP gives no message boundaries; the prefix restores them
//! so a message payload is always decoded from a complete buffer.

/// Framing limits.
#[derive(Debug, Clone, Copy)]
pub struct FrameConfig {
    /// Maximum allowed payload size in bytes. A peer announcing more than
    /// this is treated as corrupt rather than trusted with the allocation.
    pub max_payload: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        // Far above any message in the protocol; catches garbage prefixes.
        Self { max_payload: 64 * 1024 }
    }
}

/// Errors produced by framing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A length prefix exceeded the configured maximum.
    #[error("frame payload of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Prefix a payload with its little-endian length.
pub fn encode_frame(payload: &[u8], config: &FrameConfig) -> Result<Vec<u8>, FrameError> {
    if payload.len() > config.max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            limit: config.max_payload,
        });
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental frame reassembler.
///
/// Feed it whatever byte chunks the socket produces; it yields complete
/// payloads regardless of where the chunk boundaries fall.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    config: FrameConfig,
}

impl FrameDecoder {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            buf: Vec::new(),
            config,
        }
    }

    /// Append freshly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete payload, if one has fully arrived.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > self.config.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                limit: self.config.max_payload,
            });
        }
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        let payload = self.buf[4..4 + len].to_vec();
        self.buf.drain(..4 + len);
        Ok(Some(payload))
    }

    /// Bytes currently buffered but not yet yielded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

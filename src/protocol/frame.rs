//! Serial frame extraction.
//!
//! Commands arrive as `<…>`-bracketed ASCII frames on the serial line.
//! Bytes outside a frame are discarded, `<` restarts the parse buffer, `>`
//! completes the frame, CR/LF inside a frame are skipped, and an oversized
//! frame is dropped silently with resynchronization on the next `<`.
//!
//! The decoder is the single producer half of the command hand-off: `push`
//! runs in the RX ISR, the main loop consumes with `take_frame`. While a
//! completed frame waits for the consumer, no new frame begins parsing.

/// Maximum payload length between `<` and `>`.
pub const MAX_FRAME_LEN: usize = 128;

/// A completed frame payload (the bytes between the brackets).
pub type FramePayload = heapless::String<MAX_FRAME_LEN>;

/// Push-byte frame decoder.
pub struct FrameDecoder {
    buffer: heapless::Vec<u8, MAX_FRAME_LEN>,
    in_frame: bool,
    pending: Option<FramePayload>,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self {
            buffer: heapless::Vec::new(),
            in_frame: false,
            pending: None,
        }
    }

    /// Process one received byte. Safe to call from the RX ISR.
    pub fn push(&mut self, byte: u8) {
        // Hand-off discipline: never overwrite an un-consumed frame
        if self.pending.is_some() {
            return;
        }

        match byte {
            b'<' => {
                self.in_frame = true;
                self.buffer.clear();
            }
            b'>' if self.in_frame => {
                self.in_frame = false;
                let payload = core::str::from_utf8(&self.buffer)
                    .ok()
                    .and_then(|s| FramePayload::try_from(s).ok());
                self.buffer.clear();
                // Non-ASCII payloads are dropped like any other line noise
                self.pending = payload;
            }
            b'\r' | b'\n' => {}
            _ if self.in_frame => {
                if self.buffer.push(byte).is_err() {
                    // Overflow: drop the frame, resync on the next '<'
                    self.in_frame = false;
                    self.buffer.clear();
                }
            }
            _ => {}
        }
    }

    /// Whether a completed frame is waiting for the main loop.
    #[inline]
    pub fn command_ready(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the completed frame, releasing the decoder for the next one.
    pub fn take_frame(&mut self) -> Option<FramePayload> {
        self.pending.take()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

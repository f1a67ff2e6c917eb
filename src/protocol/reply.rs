//! Reply and event formatting.
//!
//! Every line leaving the firmware is CRLF-terminated and free of the
//! frame brackets. Lines queue in a bounded outbox drained by the
//! platform's TX path; when the queue overflows the oldest line is dropped
//! so the freshest events survive.

use core::fmt;
use core::fmt::Write;

/// Maximum formatted reply length, CRLF included.
pub const MAX_REPLY_LEN: usize = 96;

/// One wire-ready reply line.
pub type ReplyLine = heapless::String<MAX_REPLY_LEN>;

/// Bounded queue of outbound reply lines.
pub struct Outbox {
    queue: heapless::Deque<ReplyLine, 16>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self {
            queue: heapless::Deque::new(),
        }
    }

    /// Queue a formatted line. The CRLF terminator is appended here; a line
    /// that would not fit is truncated at the buffer boundary.
    pub fn send(&mut self, args: fmt::Arguments<'_>) {
        let mut line = ReplyLine::new();
        let _ = line.write_fmt(args);

        debug_assert!(
            !line.as_str().contains('<') && !line.as_str().contains('>'),
            "frame brackets inside a reply"
        );

        // Keep room for the terminator
        while line.len() > MAX_REPLY_LEN - 2 {
            line.pop();
        }
        let _ = line.push_str("\r\n");

        if self.queue.is_full() {
            self.queue.pop_front();
        }
        let _ = self.queue.push_back(line);
    }

    /// Queue a fixed string line.
    pub fn send_str(&mut self, line: &str) {
        self.send(format_args!("{}", line));
    }

    /// Take the next wire-ready line.
    pub fn pop(&mut self) -> Option<ReplyLine> {
        self.queue.pop_front()
    }

    /// Number of queued lines.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the outbox is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_crlf_terminated() {
        let mut outbox = Outbox::new();
        outbox.send_str("OK:STOP");
        assert_eq!(outbox.pop().unwrap().as_str(), "OK:STOP\r\n");
        assert!(outbox.pop().is_none());
    }

    #[test]
    fn test_formatted_line() {
        let mut outbox = Outbox::new();
        outbox.send(format_args!("OK:MOVE_XY:{},{}", 100, -50));
        assert_eq!(outbox.pop().unwrap().as_str(), "OK:MOVE_XY:100,-50\r\n");
    }

    #[test]
    fn test_fifo_order() {
        let mut outbox = Outbox::new();
        outbox.send_str("STEPPER_MOVE_STARTED:100,0");
        outbox.send_str("OK:MOVE_XY:100,0");
        assert!(outbox.pop().unwrap().starts_with("STEPPER_MOVE_STARTED"));
        assert!(outbox.pop().unwrap().starts_with("OK:"));
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut outbox = Outbox::new();
        for i in 0..20 {
            outbox.send(format_args!("EVENT:{}", i));
        }
        assert_eq!(outbox.len(), 16);
        // The first four lines were dropped
        assert_eq!(outbox.pop().unwrap().as_str(), "EVENT:4\r\n");
    }

    #[test]
    fn test_oversized_line_truncated_keeps_terminator() {
        let mut outbox = Outbox::new();
        let long = "X".repeat(200);
        outbox.send(format_args!("{}", long));
        let line = outbox.pop().unwrap();
        assert!(line.len() <= MAX_REPLY_LEN);
        assert!(line.ends_with("\r\n"));
    }
}

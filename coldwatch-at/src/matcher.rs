//! Incremental recognizer for the terminal reply literals.
//!
//! ESP-AT ends every reply with exactly one of two lines:
//! - `OK\r\n` (4 bytes): command accepted
//! - `ERROR\r\n` (7 bytes): command rejected
//!
//! The matcher tracks a partial match against each literal independently,
//! one byte at a time. Matching is single-pass and never backtracks: a
//! mismatching byte resets that literal's progress to zero. A payload that
//! itself contains `OK\r\n` before the real terminator is therefore reported
//! early; ESP-AT always places the terminator last, so this is accepted.

/// Accepted reply terminator
pub const REPLY_OK: &[u8] = b"OK\r\n";

/// Rejected reply terminator
pub const REPLY_ERROR: &[u8] = b"ERROR\r\n";

/// A recognized terminal reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// `OK\r\n` matched
    Ok,
    /// `ERROR\r\n` matched
    Error,
}

/// Partial-match progress against both literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatchProgress {
    /// Bytes of `OK\r\n` matched so far
    pub ok: u8,
    /// Bytes of `ERROR\r\n` matched so far
    pub error: u8,
}

/// Byte-at-a-time reply terminator recognizer
///
/// Once a literal completes, the result is latched: further bytes are
/// ignored and [`feed`](Self::feed) keeps reporting the same reply until
/// [`reset`](Self::reset) is called by whoever consumes it.
#[derive(Debug, Clone, Default)]
pub struct ResponseMatcher {
    progress: MatchProgress,
    latched: Option<Reply>,
}

impl ResponseMatcher {
    /// Create a matcher with no progress
    pub const fn new() -> Self {
        Self {
            progress: MatchProgress { ok: 0, error: 0 },
            latched: None,
        }
    }

    /// Feed one received byte
    ///
    /// Returns the latched reply once either literal has been seen in full.
    pub fn feed(&mut self, byte: u8) -> Option<Reply> {
        if self.latched.is_some() {
            return self.latched;
        }

        self.progress.ok = advance(REPLY_OK, self.progress.ok, byte);
        self.progress.error = advance(REPLY_ERROR, self.progress.error, byte);

        if self.progress.ok as usize == REPLY_OK.len() {
            self.latched = Some(Reply::Ok);
        } else if self.progress.error as usize == REPLY_ERROR.len() {
            self.latched = Some(Reply::Error);
        }

        self.latched
    }

    /// Feed a run of bytes, stopping at the first recognized reply
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<Reply> {
        for &byte in bytes {
            if let Some(reply) = self.feed(byte) {
                return Some(reply);
            }
        }
        None
    }

    /// Reply recognized so far, if any
    pub fn latched(&self) -> Option<Reply> {
        self.latched
    }

    /// Current partial-match progress
    pub fn progress(&self) -> MatchProgress {
        self.progress
    }

    /// Clear progress and any latched reply
    pub fn reset(&mut self) {
        self.progress = MatchProgress::default();
        self.latched = None;
    }
}

/// Advance one literal's progress by one byte
fn advance(literal: &[u8], progress: u8, byte: u8) -> u8 {
    match literal.get(progress as usize) {
        Some(&expected) if expected == byte => progress + 1,
        _ => 0,
    }
}

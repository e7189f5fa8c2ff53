//! Terminal-signal bookkeeping for one speaker.
//!
//! `pending` counts fan-out units still running for the speaker's
//! transcripts. The stream is complete once recognition has closed and
//! nothing is pending. Both values live behind one mutex and every
//! transition re-checks the completion condition under that lock, so exactly
//! one caller observes `true` no matter how transitions interleave.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct CompletionState {
    pending: usize,
    recognition_closed: bool,
    signalled: bool,
}

impl CompletionState {
    fn try_signal(&mut self) -> bool {
        if self.recognition_closed && self.pending == 0 && !self.signalled {
            self.signalled = true;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct CompletionTracker {
    state: Mutex<CompletionState>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit of work that must finish before completion
    pub fn begin_unit(&self) {
        self.state.lock().pending += 1;
    }

    /// Mark a unit finished. Returns true when the caller must emit the
    /// terminal signal.
    pub fn finish_unit(&self) -> bool {
        let mut state = self.state.lock();
        if state.pending == 0 {
            debug_assert!(false, "finish_unit without matching begin_unit");
            return false;
        }
        state.pending -= 1;
        state.try_signal()
    }

    /// Mark recognition closed (completion, error or end of audio without a
    /// stream). Returns true when the caller must emit the terminal signal.
    pub fn close_recognition(&self) -> bool {
        let mut state = self.state.lock();
        state.recognition_closed = true;
        state.try_signal()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    pub fn is_recognition_closed(&self) -> bool {
        self.state.lock().recognition_closed
    }

    pub fn is_signalled(&self) -> bool {
        self.state.lock().signalled
    }
}

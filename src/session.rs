use crate::history::SessionResult;
use crate::normalize::{chars_equal, normalize};
use crate::scoring;
use chrono::{DateTime, Local};
use std::time::SystemTime;

/// Lifecycle of one typing attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Target loaded, nothing typed yet.
    Idle,
    /// First character accepted, clock running.
    Running,
    /// Terminal; further input is rejected.
    Finished,
}

/// Render status of one target position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Untyped,
    Correct,
    Incorrect,
}

/// One attempt at typing one target text.
///
/// The session consumes full-buffer input events (the UI delivers the whole
/// current value, not deltas), tracks per-position match status and a
/// monotonic mistake count, and emits exactly one [`SessionResult`] when the
/// normalized input equals the normalized target.
#[derive(Debug)]
pub struct Session {
    target: String,
    target_chars: Vec<char>,
    input: Vec<char>,
    phase: Phase,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
    mistakes: u32,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        let target_chars = target.chars().collect();
        Self {
            target,
            target_chars,
            input: Vec::new(),
            phase: Phase::Idle,
            started_at: None,
            finished_at: None,
            mistakes: 0,
            result: None,
        }
    }

    /// Replace the target and reset all attempt state. Valid from any phase;
    /// used both for the initial load and for restarts. An unfinished
    /// attempt is abandoned without producing a result.
    pub fn load_target(&mut self, target: impl Into<String>) {
        *self = Session::new(target);
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    /// The result emitted on finish, if any.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Apply a full-buffer input change stamped with the current wall clock.
    pub fn apply_input(&mut self, value: &str) -> Option<SessionResult> {
        self.apply_input_at(value, SystemTime::now())
    }

    /// Apply a full-buffer input change at an explicit timestamp.
    ///
    /// Rejected (no state change, `None`) once finished or when the new
    /// value is longer than the target. Only positions the buffer grows
    /// into are evaluated for mistakes; a position re-entered after
    /// backspacing counts as newly typed again, so a re-typed index can be
    /// charged a second mistake while the original is never refunded.
    pub fn apply_input_at(&mut self, value: &str, now: SystemTime) -> Option<SessionResult> {
        if self.phase == Phase::Finished {
            return None;
        }

        let new: Vec<char> = value.chars().collect();
        if new.len() > self.target_chars.len() {
            return None;
        }

        let old_len = self.input.len();

        if old_len == 0 && !new.is_empty() && self.started_at.is_none() {
            self.started_at = Some(now);
            self.phase = Phase::Running;
        }

        if new.len() > old_len {
            for idx in old_len..new.len() {
                if !chars_equal(new[idx], self.target_chars[idx]) {
                    self.mistakes += 1;
                }
            }
        }

        self.input = new;

        let typed: String = self.input.iter().collect();
        if normalize(&typed) == normalize(&self.target) && self.finished_at.is_none() {
            return Some(self.finish(now));
        }

        None
    }

    /// Paste events never reach the buffer; character-by-character entry is
    /// what keeps the timer and mistake tracking meaningful.
    pub fn apply_paste(&mut self, _pasted: &str) {}

    fn finish(&mut self, now: SystemTime) -> SessionResult {
        self.finished_at = Some(now);
        self.phase = Phase::Finished;

        // started_at is unset when the target was empty; score zero elapsed.
        let elapsed_secs = match self.started_at {
            Some(started) => now
                .duration_since(started)
                .unwrap_or_default()
                .as_secs_f64(),
            None => 0.0,
        };

        let result = SessionResult {
            wpm: scoring::wpm(self.input.len(), elapsed_secs),
            accuracy: scoring::accuracy(self.mistakes, self.target_chars.len()),
            completed_at: DateTime::<Local>::from(now),
        };
        self.result = Some(result.clone());
        result
    }

    /// Per-position match status across the whole target.
    pub fn statuses(&self) -> Vec<CharStatus> {
        self.target_chars
            .iter()
            .enumerate()
            .map(|(idx, &expected)| match self.input.get(idx) {
                None => CharStatus::Untyped,
                Some(&typed) if chars_equal(typed, expected) => CharStatus::Correct,
                Some(_) => CharStatus::Incorrect,
            })
            .collect()
    }

    /// Index of the next character to type, while the session is live.
    pub fn cursor(&self) -> Option<usize> {
        if self.has_finished() {
            None
        } else {
            Some(self.input.len())
        }
    }

    /// Elapsed seconds as of `now`.
    ///
    /// Once finished this is fixed by the stored timestamps; while running
    /// it tracks `now` for display. Scoring never samples the display
    /// clock, it always derives from the stored timestamps.
    pub fn elapsed_at(&self, now: SystemTime) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => finished
                .duration_since(started)
                .unwrap_or_default()
                .as_secs_f64(),
            (Some(started), None) => now
                .duration_since(started)
                .unwrap_or_default()
                .as_secs_f64(),
            _ => 0.0,
        }
    }
}

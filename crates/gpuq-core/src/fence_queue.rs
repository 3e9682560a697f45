//! Token-ordered pending queue with ready-prefix draining.

use std::collections::VecDeque;

use crate::token::CompletionToken;

/// One buffered object and the token at which it becomes safe to act on.
#[derive(Debug)]
struct PendingEntry<T> {
    token: CompletionToken,
    object: T,
}

/// An ordered queue associating each pending object with the completion
/// token at which it may be released.
///
/// Entries are in non-decreasing token order because callers only ever push
/// with the current counter (or `current + 1` at submission time). The queue
/// enforces that ordering rather than repairing it: pushing a token lower
/// than the current back entry is a caller bug and panics.
#[derive(Debug)]
pub struct FenceTrackedQueue<T> {
    entries: VecDeque<PendingEntry<T>>,
}

impl<T> FenceTrackedQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append `object`, gated on `token`.
    ///
    /// # Panics
    ///
    /// Panics if `token` is lower than the most recently pushed token still
    /// in the queue.
    pub fn push(&mut self, token: CompletionToken, object: T) {
        if let Some(back) = self.entries.back() {
            assert!(
                token >= back.token,
                "fence queue pushed out of order: {} after {}",
                token,
                back.token,
            );
        }
        self.entries.push_back(PendingEntry { token, object });
    }

    /// Pop and yield, in original push order, every front entry whose token
    /// is `<= completed` (the token being reached counts as complete).
    ///
    /// The returned iterator is a finite, single-use sequence; it stops at
    /// the first entry whose token has not been reached. Only the ready
    /// prefix is examined. An empty queue yields nothing.
    pub fn drain_completed(&mut self, completed: CompletionToken) -> Drain<'_, T> {
        Drain {
            entries: &mut self.entries,
            completed,
        }
    }

    /// The token of the oldest pending entry, if any.
    pub fn next_token(&self) -> Option<CompletionToken> {
        self.entries.front().map(|e| e.token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for FenceTrackedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the ready prefix of a [`FenceTrackedQueue`].
///
/// Created by [`FenceTrackedQueue::drain_completed`]. Entries not yet
/// yielded when the iterator is dropped stay in the queue.
pub struct Drain<'a, T> {
    entries: &'a mut VecDeque<PendingEntry<T>>,
    completed: CompletionToken,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.entries.front() {
            Some(entry) if entry.token <= self.completed => {
                self.entries.pop_front().map(|e| e.object)
            }
            _ => None,
        }
    }
}

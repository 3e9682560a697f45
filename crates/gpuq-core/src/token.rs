use std::fmt;

/// Monotonically increasing completion counter for one hardware queue.
///
/// The device signals a token once every piece of work submitted up to that
/// value has finished. Tokens are assigned as `current + 1` at submission
/// time, never decrease, and are never reused across contexts. Comparing a
/// pending entry's token against the device's last reported token is the
/// only way completion is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompletionToken(u64);

impl CompletionToken {
    /// The initial token: nothing submitted, everything complete.
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The token the next submission will signal.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

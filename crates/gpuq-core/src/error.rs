/// Errors surfaced by the submission core.
///
/// Nothing in this crate retries or swallows a failure: every error is
/// returned to the immediate caller, which owns the retry policy (if any).
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Invalid device/queue handles or options at construction. Fatal; the
    /// context is not created.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The unit factory could not produce or reset an execution unit.
    /// Reported to the acquire caller.
    #[error("execution unit allocation failed: {0}")]
    Allocation(String),

    /// The device rejected submitted work. The submission is abandoned.
    #[error("work submission rejected: {0}")]
    Submission(String),

    /// The device is gone. Unrecoverable; the owning context fails every
    /// subsequent device-touching operation and must be recreated.
    #[error("device lost")]
    DeviceLost,
}

pub type Result<T> = std::result::Result<T, TunerError>;

/// Broad classification of a [`TunerError`].
///
/// The host ABI only sees a result code, but callers in Rust can tell a
/// precondition violation apart from a full pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller broke a precondition (zero ranks, bad handle, bad version).
    InvalidInput,
    /// Every context slot is in use.
    ResourceExhausted,
    /// Something inside the tuner itself went wrong.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum TunerError {
    #[error("no ranks specified for tuner")]
    ZeroRanks,

    #[error("invalid context handle {handle:#x}")]
    InvalidHandle { handle: usize },

    #[error("unsupported tuner interface version {requested} (supported: {supported})")]
    UnsupportedVersion { requested: i32, supported: i32 },

    #[error("ran out of context objects: all {capacity} slots in use")]
    PoolExhausted { capacity: usize },

    #[error("invalid tuner configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl TunerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TunerError::ZeroRanks
            | TunerError::InvalidHandle { .. }
            | TunerError::UnsupportedVersion { .. }
            | TunerError::InvalidConfig { .. } => ErrorKind::InvalidInput,
            TunerError::PoolExhausted { .. } => ErrorKind::ResourceExhausted,
            TunerError::LockPoisoned(_) => ErrorKind::Internal,
        }
    }
}

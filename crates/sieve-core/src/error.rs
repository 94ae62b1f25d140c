/// All errors that can occur within sieve.
///
/// Index and filter lookups, pipeline state violations and transform
/// failures all surface through this one enum, so `?` works across the
/// whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Scalar index outside `[-len, len)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// Boolean mask whose length differs from the sequence it selects from.
    #[error("mask length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// A filter list was supplied but contained no filters.
    #[error("filter list is empty")]
    NoFilters,

    /// Filter id that does not name one of the source's subsets.
    #[error("filter {filt} out of range: source has {count} filters")]
    FilterOutOfRange { filt: usize, count: usize },

    /// `decode` was requested while the pipeline was still setting up.
    #[error("decode unavailable during setup (branch {branch} is active)")]
    DecodeDuringSetup { branch: usize },

    /// Strict decode received a tuple whose length differs from the branch count.
    #[error("decode expects {branches} items (one per branch), got {items}")]
    BranchCountMismatch { branches: usize, items: usize },

    /// A transform rejected its input or could not be set up.
    #[error("transform `{name}` failed: {msg}")]
    Transform { name: String, msg: String },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Create a transform failure tagged with the transform's name.
    pub fn transform(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Transform {
            name: name.into(),
            msg: msg.into(),
        }
    }
}

/// Convenience Result type used throughout sieve.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}

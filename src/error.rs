use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The subject has no persisted record.
    #[error("no record stored for subject {0}")]
    RecordNotFound(String),

    /// A targeted property removal found no record for the subject.
    #[error("Not found {subject}:{property}")]
    NotFound { subject: String, property: String },

    /// The stored value is not a JSON object of strings.
    #[error("malformed record stored for subject {subject}")]
    MalformedRecord {
        subject: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to encode record for subject {subject}")]
    EncodeRecord {
        subject: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by the backing store, passed through untouched.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    #[error("unable to write store listing")]
    Io(#[from] std::io::Error),
}

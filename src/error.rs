use thiserror::Error;

/// Failures surfaced by the feed client.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed {url:?} unavailable after {attempts} attempts: {last_error}")]
    Unavailable {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("No base address configured for source {0:?}")]
    UnknownSource(String),

    #[error("No endpoint configured for operation {0:?}")]
    UnknownOperation(String),

    #[error("Failed to archive raw snapshot: {0}")]
    Archive(#[from] std::io::Error),
}

/// Failures while turning a feed document into records.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed feed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Feed document is not UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Stop {stop_id:?} has an unusable {field} value {value:?}")]
    Coordinate {
        stop_id: String,
        field: &'static str,
        value: String,
    },
}

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AresError {
    #[error("missing access token: set the {0} environment variable")]
    #[diagnostic(help(
        "a read token for the dataset repository is required before anything is downloaded"
    ))]
    MissingToken(&'static str),

    #[error("hub request failed: {0}")]
    HubHttp(String),

    #[error("hub returned status {status} for {path}: {message}")]
    HubStatus {
        status: u16,
        path: String,
        message: String,
    },

    #[error("failed to parse tree listing: {0}")]
    ListingParse(String),

    #[error("invalid remote path: {0}")]
    InvalidRemotePath(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive extraction failed for {path}: {message}")]
    Archive { path: String, message: String },

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("mongorestore failed: {0}")]
    Restore(String),
}

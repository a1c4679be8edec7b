/// Failures of the remote collaborators. A failed fetch never aborts a run;
/// the monitor logs it and carries on without that collaborator's data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request was not authorized (HTTP {0})")]
    Unauthorized(u16),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(String),
}

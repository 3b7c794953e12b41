use thiserror::Error;

/// Why a submission ended without a download.
///
/// `Display` is the text shown after `"Error: "` in the status area.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Non-success status; the body is shown verbatim.
    #[error("{0}")]
    Server(String),
    #[error("No file selected.")]
    NoFileSelected,
    #[error("{0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unexpected(err.into())
    }
}

impl SubmitError {
    pub fn status_text(&self) -> String {
        format!("Error: {self}")
    }
}

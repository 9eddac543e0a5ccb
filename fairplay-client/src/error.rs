use crate::api::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No viewer is logged in, the caller should send them to the login screen
    #[error("Authentication required")]
    AuthRequired,

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Failed to load: {0}")]
    Load(#[source] ApiError),

    #[error("Failed to submit: {0}")]
    Submit(#[source] ApiError),
}

impl Error {
    /// The underlying API error, if the server or network was involved
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Load(e) | Error::Submit(e) => Some(e),
            Error::AuthRequired | Error::EmptyContent => None,
        }
    }
}

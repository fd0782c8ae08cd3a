pub type TwibbonResult<T> = Result<T, TwibbonError>;

#[derive(thiserror::Error, Debug)]
pub enum TwibbonError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// Export or share was requested before a user photo was loaded.
    #[error("no user photo loaded")]
    NoPhoto,

    /// The host platform cannot share file payloads.
    #[error("platform does not support sharing files")]
    ShareUnsupported,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TwibbonError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TwibbonError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            TwibbonError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            TwibbonError::decode("x")
                .to_string()
                .contains("decode error:")
        );
    }

    #[test]
    fn user_errors_have_distinct_messages() {
        assert_ne!(
            TwibbonError::NoPhoto.to_string(),
            TwibbonError::ShareUnsupported.to_string()
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TwibbonError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

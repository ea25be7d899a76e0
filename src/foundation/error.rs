pub type OrreryResult<T> = Result<T, OrreryError>;

#[derive(thiserror::Error, Debug)]
pub enum OrreryError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrreryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            OrreryError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            OrreryError::surface("x")
                .to_string()
                .contains("surface error:")
        );
        assert!(
            OrreryError::capture("x")
                .to_string()
                .contains("capture error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = OrreryError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

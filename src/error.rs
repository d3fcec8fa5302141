pub type CardproofResult<T> = Result<T, CardproofError>;

#[derive(thiserror::Error, Debug)]
pub enum CardproofError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("interaction error: {0}")]
    Interaction(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardproofError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn interaction(msg: impl Into<String>) -> Self {
        Self::Interaction(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CardproofError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            CardproofError::interaction("x")
                .to_string()
                .contains("interaction error:")
        );
        assert!(
            CardproofError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            CardproofError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            CardproofError::store("x")
                .to_string()
                .contains("store error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CardproofError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

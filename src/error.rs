use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptFrameError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Rules error: {0}")]
    Rules(String),
}

impl From<PromptFrameError> for String {
    fn from(err: PromptFrameError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_into_string() {
        let message: String = PromptFrameError::Rules("Duplicate camera 'Leica M6'".to_string()).into();
        assert_eq!(message, "Rules error: Duplicate camera 'Leica M6'");
    }
}

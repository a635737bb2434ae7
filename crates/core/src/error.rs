/// Result alias that carries the custom [`HueError`] type.
pub type Result<T> = std::result::Result<T, HueError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum HueError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Decoding a still image into a frame failed.
    #[error("{0}")]
    Image(#[from] image::ImageError),
    /// A JSON configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// A sample or palette could not be written out as JSON.
    #[error("could not encode output: {0}")]
    Encode(#[source] serde_json::Error),
    /// The frame is empty or its buffer does not match its dimensions.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// The host video has nothing to show yet, or its handle is unusable.
    #[error("frame unavailable: {0}")]
    FrameUnavailable(&'static str),
    /// The quantiser or the averaging pass rejected the frame.
    #[error("palette extraction failed: {0}")]
    Extraction(String),
    /// Extraction succeeded but returned no colours to pick from.
    #[error("palette extraction produced no colours")]
    EmptyPalette,
    /// The extractor was torn down and can no longer be queried.
    #[error("palette extractor has been released")]
    ExtractorReleased,
}

impl HueError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for HueError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for HueError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_conversions_keep_text() {
        let err: HueError = "no frame".into();
        assert_eq!(err.to_string(), "no frame");

        let err: HueError = String::from("bad stride").into();
        assert!(matches!(err, HueError::Message(ref text) if text == "bad stride"));
    }

    #[test]
    fn config_errors_are_prefixed() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = HueError::from(parse);
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn encode_errors_are_not_reported_as_configuration() {
        let cause = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err = HueError::Encode(cause);
        let text = err.to_string();
        assert!(text.starts_with("could not encode output"));
        assert!(!text.contains("configuration"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

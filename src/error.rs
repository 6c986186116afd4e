use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline errors using thiserror for structured error handling.
///
/// Every stage of the nickname pipeline returns one of these. The driver
/// converts them into the failure payload, so none escapes as a crash.

#[derive(Error, Debug)]
pub enum NicknameError {
    #[error("An image file path is required")]
    MissingArgument,

    #[error("Image file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to decode image: {path}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Degenerate image dimensions: {width}x{height}")]
    DegenerateImage { width: u32, height: u32 },

    #[error("Image preprocessing failed: {0}")]
    PreprocessFailed(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Text recognition did not finish within {0:?}")]
    RecognitionTimeout(Duration),

    #[error("No nicknames found. Check that the screenshot is sharp.")]
    EmptyResult,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unexpected error during OCR processing: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown nickname rule: {0}")]
    UnknownRule(String),
}

/// Stage-level error category reported alongside a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    FileNotFound,
    Image,
    Preprocessing,
    Recognition,
    EmptyResult,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::FileNotFound => "FileNotFoundError",
            ErrorKind::Image => "ImageError",
            ErrorKind::Preprocessing => "PreprocessingError",
            ErrorKind::Recognition => "RecognitionError",
            ErrorKind::EmptyResult => "EmptyResultError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl NicknameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NicknameError::MissingArgument => ErrorKind::Argument,
            NicknameError::FileNotFound { .. } => ErrorKind::FileNotFound,
            NicknameError::ImageDecode { .. } | NicknameError::DegenerateImage { .. } => {
                ErrorKind::Image
            }
            NicknameError::PreprocessFailed(_) => ErrorKind::Preprocessing,
            NicknameError::RecognitionFailed(_) | NicknameError::RecognitionTimeout(_) => {
                ErrorKind::Recognition
            }
            NicknameError::EmptyResult => ErrorKind::EmptyResult,
            NicknameError::Config(_) => ErrorKind::Config,
            NicknameError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable message including the whole source chain
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

//! Lobby nickname OCR
//!
//! Extracts candidate player nicknames from a screenshot of a game lobby:
//! crop the player panel, enhance it, run Tesseract, then filter the
//! recognized words against nickname rules.

pub mod config;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{ErrorKind, NicknameError};
pub use ocr::{NicknameList, NicknameReport};
pub use pipeline::NicknamePipeline;

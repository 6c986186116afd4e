/// OCR module for lobby nickname extraction
///
/// This module turns a lobby screenshot into candidate player nicknames.
///
/// # Architecture
///
/// The module is split into focused submodules, one per pipeline stage:
/// - `region`: crop of the player-list panel
/// - `preprocessing`: upscale, grayscale, CLAHE, smoothing, Otsu, morphology
/// - `detection`: `TextRecognizer` seam and the Tesseract implementation
/// - `text_extraction`: raw text to cleaned word tokens
/// - `validation`: nickname shape and exclusion rules
/// - `correction`: optional spell correction of Hangul candidates
/// - `assembly`: dedupe, cap and JSON report
/// - `debug`: optional dump of intermediate images
pub mod assembly;
pub mod correction;
pub mod debug;
pub mod detection;
pub mod preprocessing;
pub mod region;
pub mod text_extraction;
pub mod validation;

pub use assembly::{assemble, NicknameList, NicknameReport, MAX_NICKNAMES};
pub use correction::{apply_corrections, resolve_corrector, HttpSpellCorrector, NoopCorrector, SpellCorrector};
pub use detection::{TesseractRecognizer, TextRecognizer};
pub use preprocessing::{ImagePreprocessor, ProcessedBitmap};
pub use region::{select_region, Region};
pub use text_extraction::{extract_tokens, Token};
pub use validation::NicknameValidator;

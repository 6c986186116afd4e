/// Tesseract text recognition
///
/// The recognizer is an external collaborator consumed through the
/// `TextRecognizer` trait. The Tesseract implementation runs each call on a
/// worker thread under a hard deadline so a hung engine fails the run
/// instead of hanging it.
use image::GrayImage;
use std::io::Cursor;
use std::time::Duration;

use crate::config::RecognizerConfig;
use crate::error::NicknameError;
use crate::utils::{run_with_deadline, DeadlineOutcome};

/// Converts a binary bitmap into raw multi-line text
pub trait TextRecognizer {
    fn recognize(&self, bitmap: &GrayImage) -> Result<String, NicknameError>;

    /// Get recognizer name (for logging)
    fn name(&self) -> &'static str;
}

/// Tesseract OCR recognizer configured for native script + Latin
pub struct TesseractRecognizer {
    settings: RecognizerConfig,
}

impl TesseractRecognizer {
    pub fn new(settings: RecognizerConfig) -> Self {
        tracing::debug!(
            "Tesseract recognizer: lang={} psm={} tessdata={}",
            settings.languages,
            settings.page_seg_mode,
            settings
                .tessdata_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "system".to_string())
        );
        Self { settings }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, bitmap: &GrayImage) -> Result<String, NicknameError> {
        let png = encode_png(bitmap)?;
        let settings = self.settings.clone();
        let timeout = self.timeout();

        match run_with_deadline("tesseract", timeout, move || engine::run(&settings, &png)) {
            DeadlineOutcome::Finished(result) => result,
            DeadlineOutcome::TimedOut => Err(NicknameError::RecognitionTimeout(timeout)),
            DeadlineOutcome::Abandoned => Err(NicknameError::RecognitionFailed(
                "recognition worker exited without a result".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Encode the bitmap as PNG for the engine
fn encode_png(bitmap: &GrayImage) -> Result<Vec<u8>, NicknameError> {
    let mut buffer = Cursor::new(Vec::new());
    bitmap
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| NicknameError::RecognitionFailed(format!("failed to encode bitmap: {}", e)))?;
    Ok(buffer.into_inner())
}

#[cfg(feature = "tesseract")]
mod engine {
    use leptess::{LepTess, Variable};

    use crate::config::RecognizerConfig;
    use crate::error::NicknameError;

    /// Initialize Tesseract and read the PNG-encoded bitmap
    pub(super) fn run(settings: &RecognizerConfig, png: &[u8]) -> Result<String, NicknameError> {
        let failed = |what: &str, detail: String| {
            NicknameError::RecognitionFailed(format!("{}: {}", what, detail))
        };

        let datapath = settings
            .tessdata_dir
            .as_ref()
            .and_then(|p| p.to_str().map(|s| s.to_string()));

        let mut tess = LepTess::new(datapath.as_deref(), &settings.languages)
            .map_err(|e| failed("failed to initialize tesseract", format!("{:?}", e)))?;

        tess.set_variable(Variable::TesseditPagesegMode, &settings.page_seg_mode)
            .map_err(|e| failed("failed to set page segmentation mode", format!("{:?}", e)))?;

        tess.set_image_from_mem(png)
            .map_err(|e| failed("failed to load bitmap", format!("{:?}", e)))?;

        tess.get_utf8_text()
            .map_err(|e| failed("failed to read recognized text", format!("{:?}", e)))
    }
}

#[cfg(not(feature = "tesseract"))]
mod engine {
    use crate::config::RecognizerConfig;
    use crate::error::NicknameError;

    pub(super) fn run(_settings: &RecognizerConfig, _png: &[u8]) -> Result<String, NicknameError> {
        Err(NicknameError::RecognitionFailed(
            "built without the `tesseract` feature; no recognition engine available".to_string(),
        ))
    }
}

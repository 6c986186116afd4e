/// Nickname extraction pipeline
///
/// Coordinates loading, region selection, enhancement, recognition,
/// filtering, optional correction and assembly.
///
/// ```text
/// NicknamePipeline
///   ├── Load (decode screenshot)
///   ├── Region (crop player panel)
///   ├── Preprocess (binary bitmap)
///   ├── Recognize (TextRecognizer)
///   ├── Extract + Validate (tokens -> candidates)
///   ├── Correct (SpellCorrector, no-op when unavailable)
///   └── Assemble (dedupe, cap, report)
/// ```
///
/// Each run is one-shot: nothing is kept between images.
use image::DynamicImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::NicknameError;
use crate::ocr::debug::DebugDump;
use crate::ocr::{
    apply_corrections, assemble, extract_tokens, resolve_corrector, select_region,
    ImagePreprocessor, NicknameList, NicknameValidator, SpellCorrector, TesseractRecognizer,
    TextRecognizer,
};
use crate::utils::{StageTimings, Timer};

pub struct NicknamePipeline {
    preprocessor: ImagePreprocessor,
    recognizer: Box<dyn TextRecognizer>,
    corrector: Box<dyn SpellCorrector>,
    validator: NicknameValidator,
    debug: Option<DebugDump>,
}

impl NicknamePipeline {
    /// Create a pipeline with explicit collaborators
    pub fn new(
        config: &PipelineConfig,
        recognizer: Box<dyn TextRecognizer>,
        corrector: Box<dyn SpellCorrector>,
    ) -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(),
            recognizer,
            corrector,
            validator: NicknameValidator::new(config.rules.clone()),
            debug: config.debug_dir.as_ref().map(DebugDump::new),
        }
    }

    /// Create a pipeline with Tesseract and the configured spell checker
    pub fn from_config(config: &PipelineConfig) -> Self {
        let recognizer = Box::new(TesseractRecognizer::new(config.recognizer.clone()));
        let corrector = resolve_corrector(&config.spell_check);
        Self::new(config, recognizer, corrector)
    }

    pub fn validator(&self) -> &NicknameValidator {
        &self.validator
    }

    /// Run the full pipeline on an image file
    pub fn run(&self, path: &Path) -> Result<NicknameList, NicknameError> {
        let mut timings = StageTimings::default();

        let timer = Timer::start();
        let image = load_image(path)?;
        timings.load_ms = timer.elapsed_ms();

        let result = self.run_image(&image, &mut timings);
        timings.log_summary();
        result
    }

    /// Run every stage after loading on an already decoded image
    pub fn run_image(
        &self,
        image: &DynamicImage,
        timings: &mut StageTimings,
    ) -> Result<NicknameList, NicknameError> {
        let timer = Timer::start();
        let (_, roi) = select_region(image)?;
        if let Some(debug) = &self.debug {
            debug.save_roi(&roi);
        }
        let bitmap = self.preprocessor.preprocess(&roi)?;
        if let Some(debug) = &self.debug {
            debug.save_processed(&bitmap.image);
        }
        timings.preprocess_ms = timer.elapsed_ms();

        let timer = Timer::start();
        let raw_text = self.recognizer.recognize(&bitmap.image)?;
        timings.recognize_ms = timer.elapsed_ms();
        tracing::info!("Raw OCR result ({}):\n{}", self.recognizer.name(), raw_text);

        let timer = Timer::start();
        let candidates = self.filter_candidates(&raw_text);
        timings.filter_ms = timer.elapsed_ms();
        tracing::info!("Nickname candidates: {:?}", candidates);

        let timer = Timer::start();
        let corrected = apply_corrections(&candidates, self.corrector.as_ref(), &self.validator);
        timings.correct_ms = timer.elapsed_ms();

        let list = assemble(corrected, &self.validator)?;
        tracing::info!("Final nicknames: {:?} (total {})", list.nicknames, list.total_found);
        Ok(list)
    }

    /// Extract tokens and keep the valid ones, distinct, in first-seen order
    pub fn filter_candidates(&self, raw_text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        extract_tokens(raw_text)
            .into_iter()
            .map(|token| token.text)
            .filter(|text| self.validator.is_valid(text))
            .filter(|text| seen.insert(text.clone()))
            .collect()
    }
}

/// Decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage, NicknameError> {
    let image = image::open(path).map_err(|source| NicknameError::ImageDecode {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!("Original image size: {}x{}", image.width(), image.height());
    Ok(image)
}

/// Resolve the single positional argument to an existing file
pub fn resolve_image_path(arg: Option<String>) -> Result<PathBuf, NicknameError> {
    let arg = arg.ok_or(NicknameError::MissingArgument)?;

    let path = PathBuf::from(&arg);
    if !path.is_file() {
        return Err(NicknameError::FileNotFound { path: arg });
    }

    Ok(path)
}

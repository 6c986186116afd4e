/// Optional spell correction of native-script candidates
///
/// The correction service is resolved once at startup. When it is disabled
/// or not configured a no-op corrector takes its place, so the pipeline
/// never branches on availability.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::SpellCheckConfig;

use super::validation::NicknameValidator;

/// Proposes a corrected spelling for a single word
pub trait SpellCorrector {
    fn correct(&self, word: &str) -> Result<String>;

    /// Get corrector name (for logging)
    fn name(&self) -> &'static str;
}

/// Returns every word unchanged
#[derive(Debug, Default)]
pub struct NoopCorrector;

impl SpellCorrector for NoopCorrector {
    fn correct(&self, word: &str) -> Result<String> {
        Ok(word.to_string())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Response body of the correction service
#[derive(Debug, Deserialize)]
struct CorrectionResponse {
    corrected: String,
}

/// Calls an HTTP correction service: POST `{"text": word}`, expects
/// `{"corrected": "..."}`
pub struct HttpSpellCorrector {
    endpoint: String,
    timeout: Duration,
}

impl HttpSpellCorrector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl SpellCorrector for HttpSpellCorrector {
    fn correct(&self, word: &str) -> Result<String> {
        let user_agent = format!("lobby-nickname-ocr/{}", env!("CARGO_PKG_VERSION"));

        let response = ureq::post(&self.endpoint)
            .set("User-Agent", &user_agent)
            .timeout(self.timeout)
            .send_json(ureq::json!({ "text": word }))
            .with_context(|| format!("spell-check request to {} failed", self.endpoint))?;

        if response.status() != 200 {
            return Err(anyhow!("spell-check service returned status {}", response.status()));
        }

        let body: CorrectionResponse = response
            .into_json()
            .context("malformed spell-check response")?;

        Ok(body.corrected)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Pick the corrector implementation for this run
pub fn resolve_corrector(config: &SpellCheckConfig) -> Box<dyn SpellCorrector> {
    match (config.enabled, config.endpoint.as_deref()) {
        (true, Some(endpoint)) if !endpoint.trim().is_empty() => {
            tracing::info!("Spell check enabled via {}", endpoint);
            Box::new(HttpSpellCorrector::new(
                endpoint.trim(),
                Duration::from_millis(config.timeout_ms),
            ))
        }
        (true, _) => {
            tracing::warn!("Spell check enabled but no endpoint configured. Skipping spell check.");
            Box::new(NoopCorrector)
        }
        _ => Box::new(NoopCorrector),
    }
}

/// Replace candidates with their corrected spelling where that is safe.
///
/// Only candidates containing native-script characters are submitted. A
/// correction is used when it differs from the original and is itself a
/// valid nickname. Service failures keep the original and move on.
pub fn apply_corrections(
    candidates: &[String],
    corrector: &dyn SpellCorrector,
    validator: &NicknameValidator,
) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| {
            if !NicknameValidator::has_native_chars(candidate) {
                return candidate.clone();
            }

            match corrector.correct(candidate) {
                Ok(corrected) if corrected != *candidate && validator.is_valid(&corrected) => {
                    tracing::info!("Spell correction: {} -> {}", candidate, corrected);
                    corrected
                }
                Ok(_) => candidate.clone(),
                Err(e) => {
                    tracing::warn!("Spell check failed ({}): {:#}", candidate, e);
                    candidate.clone()
                }
            }
        })
        .collect()
}

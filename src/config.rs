use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable that points at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "NICKNAME_OCR_CONFIG";

const CONFIG_FILE_NAME: &str = "nickname_ocr.json";
const APP_DIR_NAME: &str = "lobby-nickname-ocr";

fn default_exclusion_words() -> Vec<String> {
    [
        "레벨", "길드", "서버", "클래스", "전투력", "아이템레벨",
        "Level", "Guild", "Server", "Class", "Combat", "Item",
        "로스트아크", "LostArk", "대기실", "파티", "Party",
        "모집", "참여", "신청", "수락", "거부", "나가기",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

/// Shape and exclusion rules a token must satisfy to count as a nickname
///
/// Config files go through `from_rule_map`, so a misspelled rule name is an
/// error rather than a silent fallback to the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NicknameRules {
    /// Minimum length in characters (inclusive)
    pub min_length: usize,

    /// Maximum length in characters (inclusive)
    pub max_length: usize,

    /// Tokens made only of Latin letters must be at least this long
    pub min_latin_only_length: usize,

    /// Reject tokens made only of digits
    pub reject_all_digits: bool,

    /// UI-chrome words; any token containing one (case-insensitive) is rejected
    pub exclusion_words: Vec<String>,
}

impl Default for NicknameRules {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 12,
            min_latin_only_length: 3,
            reject_all_digits: true,
            exclusion_words: default_exclusion_words(),
        }
    }
}

impl NicknameRules {
    /// Build rules from a `rule-name -> parameter` map.
    ///
    /// Rules missing from the map keep their default value.
    pub fn from_rule_map(map: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let mut rules = Self::default();

        for (name, value) in map {
            match name.as_str() {
                "min_length" => rules.min_length = parse_count(name, value)?,
                "max_length" => rules.max_length = parse_count(name, value)?,
                "min_latin_only_length" => rules.min_latin_only_length = parse_count(name, value)?,
                "reject_all_digits" => {
                    rules.reject_all_digits = value.as_bool().ok_or_else(|| {
                        ConfigError::Invalid(format!("{} must be a boolean", name))
                    })?;
                }
                "exclusion_words" => {
                    rules.exclusion_words = serde_json::from_value(value.clone()).map_err(|_| {
                        ConfigError::Invalid(format!("{} must be a list of strings", name))
                    })?;
                }
                other => return Err(ConfigError::UnknownRule(other.to_string())),
            }
        }

        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length == 0 {
            return Err(ConfigError::Invalid("min_length must be at least 1".into()));
        }
        if self.min_length > self.max_length {
            return Err(ConfigError::Invalid(format!(
                "min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

fn parse_count(name: &str, value: &Value) -> Result<usize, ConfigError> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| ConfigError::Invalid(format!("{} must be a non-negative integer", name)))
}

/// Text recognition engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Tesseract language string (native script + Latin)
    pub languages: String,

    /// Page segmentation mode. 6 = single uniform block of text
    pub page_seg_mode: String,

    /// Explicit tessdata directory (None = system installation)
    pub tessdata_dir: Option<PathBuf>,

    /// Hard deadline for a single recognition call
    pub timeout_secs: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            languages: "kor+eng".to_string(),
            page_seg_mode: "6".to_string(),
            tessdata_dir: None,
            timeout_secs: 30,
        }
    }
}

/// Optional spell-correction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellCheckConfig {
    pub enabled: bool,

    /// POST endpoint accepting `{"text": ...}` and answering `{"corrected": ...}`
    pub endpoint: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SpellCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Nickname validity rules
    pub rules: NicknameRules,

    /// Recognizer settings
    pub recognizer: RecognizerConfig,

    /// Spell-check collaborator settings
    pub spell_check: SpellCheckConfig,

    /// Directory receiving roi.png / processed.png for inspection
    pub debug_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load configuration from the first location that exists.
    ///
    /// Falls back to defaults when no file is found. Never writes to disk.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let mut document: Value =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;

        let rule_map = match document.as_object_mut().and_then(|root| root.remove("rules")) {
            Some(Value::Object(map)) => Some(map.into_iter().collect::<HashMap<_, _>>()),
            Some(_) => return Err(ConfigError::Invalid("rules must be an object".into())),
            None => None,
        };

        let mut config: PipelineConfig =
            serde_json::from_value(document).map_err(|e| load_failed(Box::new(e)))?;
        if let Some(map) = rule_map {
            config.rules = NicknameRules::from_rule_map(&map)?;
        }
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        if self.recognizer.timeout_secs == 0 {
            return Err(ConfigError::Invalid("recognizer.timeout_secs must be positive".into()));
        }
        if self.spell_check.enabled && self.spell_check.timeout_ms == 0 {
            return Err(ConfigError::Invalid("spell_check.timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// First config location that applies: the env var path (even if
    /// missing, so the error is reported), then the exe-relative file,
    /// then the platform config directory.
    fn locate() -> Option<PathBuf> {
        if let Some(explicit) = env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(explicit));
        }

        let exe_relative = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("config").join(CONFIG_FILE_NAME)));
        let platform = dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.json"));

        [exe_relative, platform]
            .into_iter()
            .flatten()
            .find(|path| path.exists())
    }
}

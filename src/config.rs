use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chat_template::ChatTemplate;
use crate::errors::EvalError;
use crate::extract::TagPair;

const CONFIG_DIR: &str = ".tooleval";
const OPEN_TAG_ENV: &str = "TOOLEVAL_OPEN_TAG";
const CLOSE_TAG_ENV: &str = "TOOLEVAL_CLOSE_TAG";
const OUTPUT_DIR_ENV: &str = "TOOLEVAL_OUTPUT_DIR";

/// Evaluation settings, from `.tooleval/config.{json,yaml}` with environment overrides on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Markers around each tool call in generated text
    pub tags: TagPair,
    /// Write chosen/rejected pairs for failed samples
    pub emit_preference_pairs: bool,
    /// Template used to cut the assistant turn out of full completions
    pub chat_template: ChatTemplate,
    /// Token stripped from completions before extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eos_token: Option<String>,
    pub output_dir: PathBuf,
    pub results_file: String,
    pub preference_pairs_file: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            tags: TagPair::default(),
            emit_preference_pairs: false,
            chat_template: ChatTemplate::default(),
            eos_token: None,
            output_dir: PathBuf::from("."),
            results_file: "function_calling_eval_results.jsonl".to_string(),
            preference_pairs_file: "function_calling_dpo_pairs.jsonl".to_string(),
        }
    }
}

impl EvalConfig {
    /// Load from `.tooleval/config.json` or `.tooleval/config.yaml` in the working
    /// directory. Missing files fall back to defaults; environment overrides always apply.
    pub fn load() -> Result<Self, EvalError> {
        let dir = Path::new(CONFIG_DIR);
        let candidates = ["config.json", "config.yaml", "config.yml"];
        let mut config = match candidates.iter().map(|f| dir.join(f)).find(|p| p.exists()) {
            Some(path) => Self::read_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit config file; the format follows the extension.
    pub fn load_from(path: &Path) -> Result<Self, EvalError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, EvalError> {
        let content = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(open) = non_empty_env(OPEN_TAG_ENV) {
            self.tags.open = open;
        }
        if let Some(close) = non_empty_env(CLOSE_TAG_ENV) {
            self.tags.close = close;
        }
        if let Some(dir) = non_empty_env(OUTPUT_DIR_ENV) {
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    pub fn preference_pairs_path(&self) -> PathBuf {
        self.output_dir.join(&self.preference_pairs_file)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chat_template::{ChatTemplate, assistant_message};
use crate::errors::EvalError;
use crate::evaluator::{EvaluationSample, Evaluator, expected_calls_from_value};
use crate::schema::{ToolSpec, parse_tool_specs};
use crate::types::{SampleId, ToolCall};

pub const NO_REFERENCE_CALLS: &str = "no tool calls found in reference";

/// One ShareGPT-style conversation turn.
#[derive(Debug, Clone, Deserialize)]
pub struct Turn {
    pub from: String,
    pub value: String,
}

/// A dataset line as stored on disk.
///
/// Expected calls come from `expected` (or the Hermes-format `completion` field,
/// a JSON-encoded call list) when present, otherwise from the tagged `reference`
/// text, otherwise from the last `gpt` turn of `conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(alias = "model_output")]
    pub generated: String,
    #[serde(default, alias = "completion")]
    pub expected: Option<Value>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub tools: Value,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub conversations: Vec<Turn>,
}

/// A sample with its tool specs and expected calls resolved, ready for evaluation.
#[derive(Debug, Clone)]
pub struct PreparedSample {
    pub id: SampleId,
    pub completion: String,
    pub expected: Vec<ToolCall>,
    pub tools: Vec<ToolSpec>,
    pub context: Option<String>,
    /// Set when the reference text held no usable tool call.
    pub reference_error: Option<String>,
}

impl PreparedSample {
    pub fn as_sample(&self) -> EvaluationSample<'_> {
        EvaluationSample {
            completion: &self.completion,
            expected: &self.expected,
            tools: &self.tools,
            context: self.context.as_deref(),
        }
    }
}

/// How raw completions are cut down to the assistant message.
#[derive(Debug, Clone, Default)]
pub struct CompletionFormat {
    pub chat_template: ChatTemplate,
    pub eos_token: Option<String>,
}

impl SampleRecord {
    pub fn prepare(
        &self,
        index: usize,
        evaluator: &Evaluator,
        format: &CompletionFormat,
    ) -> Result<PreparedSample, EvalError> {
        let id = match &self.id {
            Some(Value::String(s)) => SampleId::new(s.clone()),
            Some(Value::Null) | None => SampleId::new(index.to_string()),
            Some(other) => SampleId::new(other.to_string()),
        };

        let tools = parse_tool_specs(&self.tools)?;
        let completion = assistant_message(
            &self.generated,
            format.chat_template,
            format.eos_token.as_deref(),
        );

        let mut reference_error = None;
        let expected = match (&self.expected, self.reference_text()) {
            (Some(expected), _) => expected_calls_from_value(expected)?,
            (None, Some(reference)) => {
                let extraction = evaluator.extract_calls(reference);
                if extraction.calls.is_empty() {
                    reference_error = Some(NO_REFERENCE_CALLS.to_string());
                }
                extraction.calls
            }
            (None, None) => {
                return Err(EvalError::InvalidSample(format!(
                    "sample {id} has no expected calls or reference"
                )));
            }
        };

        Ok(PreparedSample {
            id,
            completion,
            expected,
            tools,
            context: self.context.clone().or_else(|| self.conversation_context()),
            reference_error,
        })
    }

    fn reference_text(&self) -> Option<&str> {
        self.reference.as_deref().or_else(|| {
            self.conversations
                .iter()
                .rev()
                .find(|turn| turn.from == "gpt")
                .map(|turn| turn.value.as_str())
        })
    }

    /// System prompt followed by the first human turn.
    fn conversation_context(&self) -> Option<String> {
        let system = self.conversations.iter().find(|t| t.from == "system");
        let question = self.conversations.iter().find(|t| t.from == "human");
        let parts: Vec<&str> = [system, question]
            .into_iter()
            .flatten()
            .map(|t| t.value.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// Read JSONL sample records. Blank lines are ignored; malformed lines are logged and
/// skipped so one bad row doesn't sink the batch.
pub fn read_samples(path: &Path) -> Result<Vec<SampleRecord>, EvalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SampleRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("{}:{}: skipping malformed sample: {e}", path.display(), line_no + 1),
        }
    }

    Ok(records)
}

/// A file is returned as-is; a directory is walked for `*.jsonl` files, sorted by path.
pub fn discover_dataset_files(path: &Path) -> Result<Vec<PathBuf>, EvalError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        return Err(EvalError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("dataset path not found: {}", path.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("jsonl")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

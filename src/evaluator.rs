use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compare::compare_arguments;
use crate::errors::EvalError;
use crate::extract::{Extractor, TagPair};
use crate::normalize::normalize;
use crate::parse::parse_tool_call_value;
use crate::schema::{ToolSpec, validate_call};
use crate::types::{Collected, RawToolCall, Status, ToolCall};
use crate::validate::validate_tool_calls;

pub const NO_TOOL_CALLS_FOUND: &str = "no tool calls found";

/// Last stage a sample entered before its verdict was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStage {
    Extracting,
    Parsing,
    Matching,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub stage: EvalStage,
    pub matched_calls: Vec<ToolCall>,
    pub diagnostics: Vec<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.status.is_passed()
    }
}

/// Expected call serialized as tagged text, paired with the rejected raw output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePair {
    pub context: String,
    pub chosen: String,
    pub rejected: String,
}

/// One sample's inputs, borrowed for the duration of its evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSample<'a> {
    pub completion: &'a str,
    pub expected: &'a [ToolCall],
    pub tools: &'a [ToolSpec],
    pub context: Option<&'a str>,
}

impl<'a> EvaluationSample<'a> {
    pub fn new(completion: &'a str, expected: &'a [ToolCall], tools: &'a [ToolSpec]) -> Self {
        Self {
            completion,
            expected,
            tools,
            context: None,
        }
    }

    pub fn with_context(mut self, context: &'a str) -> Self {
        self.context = Some(context);
        self
    }
}

/// Tool calls recovered from a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub block_count: usize,
    pub calls: Vec<ToolCall>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub generated_calls: Vec<ToolCall>,
    pub preference_pair: Option<PreferencePair>,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    extractor: Extractor,
    emit_preference_pairs: bool,
}

impl Evaluator {
    pub fn new(tags: TagPair) -> Result<Self, EvalError> {
        Ok(Self {
            extractor: Extractor::new(tags)?,
            emit_preference_pairs: false,
        })
    }

    pub fn with_preference_pairs(mut self, enabled: bool) -> Self {
        self.emit_preference_pairs = enabled;
        self
    }

    pub fn tags(&self) -> &TagPair {
        self.extractor.tags()
    }

    /// Extract, parse, normalize and structurally validate every block in `text`.
    pub fn extract_calls(&self, text: &str) -> Extraction {
        let blocks = self.extractor.extract(text);
        let block_count = blocks.len();

        let mut parsed: Collected<(usize, RawToolCall)> = Collected::default();
        for (index, block) in blocks.into_iter().enumerate() {
            match parse_tool_call_value(block) {
                Ok(map) => parsed.push_item((index, normalize(&map))),
                Err(err) => parsed.push_diagnostic(format!("block {index} dropped: {err}")),
            }
        }

        let validated = validate_tool_calls(parsed.items);
        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(validated.diagnostics);

        Extraction {
            block_count,
            calls: validated.items,
            diagnostics,
        }
    }

    pub fn evaluate(&self, sample: &EvaluationSample<'_>) -> Evaluation {
        let extraction = self.extract_calls(sample.completion);
        let mut diagnostics = extraction.diagnostics;
        let generated = extraction.calls;

        if extraction.block_count == 0 || generated.is_empty() {
            diagnostics.push(NO_TOOL_CALLS_FOUND.to_string());
            let stage = if extraction.block_count == 0 {
                EvalStage::Extracting
            } else {
                EvalStage::Parsing
            };
            let verdict = Verdict {
                status: Status::Failed,
                stage,
                matched_calls: Vec::new(),
                diagnostics,
            };
            return self.finish(sample, verdict, generated);
        }

        let mut all_valid = true;
        if generated.len() != sample.expected.len() {
            all_valid = false;
            diagnostics.push(format!(
                "expected {} tool calls, got {}",
                sample.expected.len(),
                generated.len()
            ));
        }

        let mut used = vec![false; generated.len()];
        let mut matched_calls = Vec::new();

        for expected in sample.expected {
            let found = generated
                .iter()
                .enumerate()
                .position(|(i, call)| !used[i] && call.name == expected.name);
            let Some(index) = found else {
                all_valid = false;
                diagnostics.push(format!("function not found: {}", expected.name));
                continue;
            };
            used[index] = true;
            let call = &generated[index];

            let check = validate_call(call, sample.tools);
            if !check.valid {
                all_valid = false;
                diagnostics.push(format!(
                    "schema validation failed for {}: {}",
                    call.name,
                    check.reason.unwrap_or_default()
                ));
            }

            if compare_arguments(&call.arguments, &expected.arguments) == Status::Failed {
                all_valid = false;
                diagnostics.push(format!("argument mismatch for {}", call.name));
            }

            matched_calls.push(call.clone());
        }

        let verdict = Verdict {
            status: Status::from_bool(all_valid),
            stage: EvalStage::Matching,
            matched_calls,
            diagnostics,
        };
        self.finish(sample, verdict, generated)
    }

    fn finish(
        &self,
        sample: &EvaluationSample<'_>,
        verdict: Verdict,
        generated_calls: Vec<ToolCall>,
    ) -> Evaluation {
        let preference_pair = (self.emit_preference_pairs && !verdict.passed())
            .then(|| self.preference_pair(sample));
        Evaluation {
            verdict,
            generated_calls,
            preference_pair,
        }
    }

    /// Chosen text is every expected call as a tagged block, in order.
    pub fn preference_pair(&self, sample: &EvaluationSample<'_>) -> PreferencePair {
        PreferencePair {
            context: sample.context.unwrap_or_default().to_string(),
            chosen: format_tool_calls(sample.expected, self.tags()),
            rejected: sample.completion.to_string(),
        }
    }
}

/// Canonical tagged serialization, one block per call.
pub fn format_tool_calls(calls: &[ToolCall], tags: &TagPair) -> String {
    calls
        .iter()
        .map(|call| tags.wrap(&call.to_value().to_string()))
        .collect()
}

/// Expected calls as a list, or a single record normalized to a one-element list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SingleOrList {
    List(Vec<Value>),
    Single(Value),
}

/// Build expected calls from reference data already in canonical form.
///
/// `arguments` may be given as a JSON-encoded object string, as chat APIs return it.
pub fn expected_calls_from_value(value: &Value) -> Result<Vec<ToolCall>, EvalError> {
    let value = match value {
        Value::String(encoded) => serde_json::from_str(encoded)?,
        other => other.clone(),
    };
    let records = match serde_json::from_value::<SingleOrList>(value)? {
        SingleOrList::List(records) => records,
        SingleOrList::Single(record) => vec![record],
    };
    records.iter().map(expected_call_from_value).collect()
}

fn expected_call_from_value(record: &Value) -> Result<ToolCall, EvalError> {
    let obj = record
        .as_object()
        .ok_or_else(|| EvalError::InvalidSample("expected call must be a mapping".to_string()))?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| EvalError::InvalidSample("expected call is missing a name".to_string()))?;

    let arguments = match obj.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded)? {
            Value::Object(args) => args,
            _ => {
                return Err(EvalError::InvalidSample(format!(
                    "arguments of expected call '{name}' are not a mapping"
                )));
            }
        },
        Some(_) => {
            return Err(EvalError::InvalidSample(format!(
                "arguments of expected call '{name}' are not a mapping"
            )));
        }
    };

    Ok(ToolCall::new(name, arguments))
}

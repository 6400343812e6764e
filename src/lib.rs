pub mod chat_template;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod evaluator;
pub mod extract;
pub mod normalize;
pub mod parse;
pub mod report;
pub mod schema;
pub mod types;
pub mod ui;
pub mod validate;

pub use crate::chat_template::{ChatTemplate, assistant_message};
pub use crate::compare::{compare_arguments, values_equal};
pub use crate::config::EvalConfig;
pub use crate::dataset::{CompletionFormat, PreparedSample, SampleRecord};
pub use crate::errors::{EvalError, ParseError};
pub use crate::evaluator::{
    EvalStage, Evaluation, EvaluationSample, Evaluator, Extraction, PreferencePair, Verdict,
    expected_calls_from_value, format_tool_calls,
};
pub use crate::extract::{Extractor, TagPair, extract_blocks};
pub use crate::normalize::normalize;
pub use crate::parse::{parse_block, parse_tool_call_value};
pub use crate::report::{BatchReport, EvaluationSummary, SampleResult, run_batch};
pub use crate::schema::{ParamType, SchemaCheck, ToolSpec, parse_tool_specs, validate_call};
pub use crate::types::{Collected, RawToolCall, SampleId, Status, ToolCall, ToolName};
pub use crate::validate::validate_tool_calls;

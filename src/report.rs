use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dataset::PreparedSample;
use crate::errors::EvalError;
use crate::evaluator::{EvalStage, Evaluator, PreferencePair, Verdict};
use crate::types::{SampleId, Status, ToolCall};

/// Per-sample line of the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub id: SampleId,
    pub status: Status,
    pub stage: EvalStage,
    pub matched_calls: Vec<ToolCall>,
    pub generated_calls: Vec<ToolCall>,
    pub diagnostics: Vec<String>,
    pub completion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub pass_rate: f64,
    pub total: usize,
    pub passed: usize,
}

impl EvaluationSummary {
    pub fn from_results(results: &[SampleResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.status.is_passed()).count();
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };
        Self {
            pass_rate,
            total,
            passed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<SampleResult>,
    pub preference_pairs: Vec<PreferencePair>,
}

impl BatchReport {
    pub fn summary(&self) -> EvaluationSummary {
        EvaluationSummary::from_results(&self.results)
    }

    /// Write results JSONL, plus the preference pairs file when any pairs were produced.
    /// A pairs file left by an earlier run is removed when this run has none.
    pub fn write(&self, results_path: &Path, pairs_path: &Path) -> Result<(), EvalError> {
        write_jsonl(results_path, &self.results)?;
        if !self.preference_pairs.is_empty() {
            write_jsonl(pairs_path, &self.preference_pairs)?;
        } else if pairs_path.is_file() {
            fs::remove_file(pairs_path)?;
        }
        Ok(())
    }
}

/// Evaluate every sample independently and collect the outcomes in input order.
pub fn run_batch(evaluator: &Evaluator, samples: &[PreparedSample]) -> BatchReport {
    let mut report = BatchReport::default();

    for sample in samples {
        let (verdict, generated_calls, pair) = match &sample.reference_error {
            Some(reason) => (
                Verdict {
                    status: Status::Failed,
                    stage: EvalStage::Extracting,
                    matched_calls: Vec::new(),
                    diagnostics: vec![reason.clone()],
                },
                Vec::new(),
                None,
            ),
            None => {
                let evaluation = evaluator.evaluate(&sample.as_sample());
                (
                    evaluation.verdict,
                    evaluation.generated_calls,
                    evaluation.preference_pair,
                )
            }
        };

        log::info!("sample {}: {}", sample.id, verdict.status);
        for diagnostic in &verdict.diagnostics {
            log::debug!("sample {}: {diagnostic}", sample.id);
        }

        report.preference_pairs.extend(pair);
        report.results.push(SampleResult {
            id: sample.id.clone(),
            status: verdict.status,
            stage: verdict.stage,
            matched_calls: verdict.matched_calls,
            generated_calls,
            diagnostics: verdict.diagnostics,
            completion: sample.completion.clone(),
        });
    }

    report
}

/// Write one JSON document per line, creating parent directories as needed.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), EvalError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CompletionFormat, SampleRecord};
    use serde_json::json;
    use tempfile::TempDir;

    fn prepared(value: serde_json::Value, evaluator: &Evaluator) -> PreparedSample {
        let record: SampleRecord = serde_json::from_value(value).unwrap();
        record
            .prepare(0, evaluator, &CompletionFormat::default())
            .unwrap()
    }

    fn samples(evaluator: &Evaluator) -> Vec<PreparedSample> {
        let tools = json!([{"name": "f", "parameters": {"a": {"type": "number", "required": true}}}]);
        vec![
            prepared(
                json!({
                    "id": "pass",
                    "generated": "<tool_call>{\"name\": \"f\", \"arguments\": {\"a\": 1}}</tool_call>",
                    "expected": {"name": "f", "arguments": {"a": 1.0}},
                    "tools": tools.clone()
                }),
                evaluator,
            ),
            prepared(
                json!({
                    "id": "fail",
                    "generated": "no calls",
                    "expected": {"name": "f", "arguments": {"a": 1}},
                    "tools": tools.clone(),
                    "context": "q"
                }),
                evaluator,
            ),
            prepared(
                json!({"id": "noref", "generated": "x", "reference": "nothing", "tools": tools}),
                evaluator,
            ),
        ]
    }

    #[test]
    fn batch_collects_results_and_pairs() {
        let evaluator = Evaluator::default().with_preference_pairs(true);
        let report = run_batch(&evaluator, &samples(&evaluator));

        let statuses: Vec<Status> = report.results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Status::Passed, Status::Failed, Status::Failed]);
        assert_eq!(report.results[2].diagnostics, vec![crate::dataset::NO_REFERENCE_CALLS]);
        assert_eq!(report.preference_pairs.len(), 1);
        assert_eq!(report.preference_pairs[0].context, "q");

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert!((summary.pass_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_has_zero_pass_rate() {
        let summary = EvaluationSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 0.0);
    }

    #[test]
    fn writes_jsonl_files() {
        let evaluator = Evaluator::default().with_preference_pairs(true);
        let report = run_batch(&evaluator, &samples(&evaluator));

        let dir = TempDir::new().unwrap();
        let results_path = dir.path().join("out/results.jsonl");
        let pairs_path = dir.path().join("out/pairs.jsonl");
        report.write(&results_path, &pairs_path).unwrap();

        let results = std::fs::read_to_string(&results_path).unwrap();
        let lines: Vec<&str> = results.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: SampleResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id.as_str(), "pass");
        assert_eq!(first.status, Status::Passed);

        let pairs = std::fs::read_to_string(&pairs_path).unwrap();
        assert_eq!(pairs.lines().count(), 1);
    }

    #[test]
    fn stale_pairs_file_is_removed_when_no_pairs() {
        let dir = TempDir::new().unwrap();
        let results_path = dir.path().join("results.jsonl");
        let pairs_path = dir.path().join("pairs.jsonl");
        std::fs::write(&pairs_path, "{\"context\":\"old\"}\n").unwrap();

        let evaluator = Evaluator::default();
        let report = run_batch(&evaluator, &samples(&evaluator)[..1]);
        assert!(report.preference_pairs.is_empty());
        report.write(&results_path, &pairs_path).unwrap();

        assert!(results_path.exists());
        assert!(!pairs_path.exists());
    }

    #[test]
    fn preference_pair_serialization_is_stable() {
        let evaluator = Evaluator::default().with_preference_pairs(true);
        let report = run_batch(&evaluator, &samples(&evaluator));
        insta::assert_json_snapshot!(report.preference_pairs[0], @r###"
        {
          "context": "q",
          "chosen": "<tool_call>\n{\"name\":\"f\",\"arguments\":{\"a\":1}}\n</tool_call>\n",
          "rejected": "no calls"
        }
        "###);
    }
}

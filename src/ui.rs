use colored::*;
use std::path::Path;

use crate::report::{EvaluationSummary, SampleResult};

/// Environment variable that enables machine-readable JSON events on stderr when set to "1" or "true".
const MACHINE_LOG_ENV: &str = "TOOLEVAL_MACHINE_LOG";
const PREVIEW_CHARS: usize = 120;

pub fn init_logging() {
    // Internal logs are opt-in via RUST_LOG. Console output stays separate.
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Warn);
    }
    let _ = builder.try_init();
}

fn machine_log_enabled() -> bool {
    matches!(
        std::env::var(MACHINE_LOG_ENV)
            .ok()
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("1") | Some("true")
    )
}

fn emit_machine_event(kind: &str, data: serde_json::Value) {
    if !machine_log_enabled() {
        return;
    }

    let event = serde_json::json!({
        "kind": kind,
        "data": data,
    });

    if let Ok(line) = serde_json::to_string(&event) {
        eprintln!("{line}");
    }
}

/// Single-line console preview: control characters dropped, whitespace collapsed, truncated.
pub fn preview(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

pub fn warn(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    eprintln!("{} {}", "!".yellow().bold(), preview(raw).yellow());
    emit_machine_event("warn", serde_json::json!({ "message": raw }));
}

pub fn error(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    eprintln!("{} {}", "✗".red().bold(), raw.red());
    emit_machine_event("error", serde_json::json!({ "message": raw }));
}

pub fn header(dataset: &Path, samples: usize) {
    println!(
        "{} {} | {} | {}",
        ">>".bold(),
        "tooleval".bold(),
        dataset.display().to_string().cyan(),
        format!("{samples} samples").dimmed()
    );
    emit_machine_event(
        "header",
        serde_json::json!({
            "dataset": dataset.display().to_string(),
            "samples": samples,
        }),
    );
}

pub fn sample_result(result: &SampleResult) {
    let status = if result.status.is_passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("{status} {}", result.id.as_str().cyan());
    for diagnostic in &result.diagnostics {
        println!("  {} {}", "└─".dimmed(), preview(diagnostic).dimmed());
    }
    emit_machine_event(
        "sample",
        serde_json::json!({
            "id": result.id,
            "status": result.status,
            "diagnostics": result.diagnostics,
        }),
    );
}

pub fn wrote_file(label: &str, path: &Path) {
    println!("{} {label}: {}", "●".dimmed(), path.display().to_string().dimmed());
}

pub fn summary(summary: &EvaluationSummary) {
    let rate = format!("{:.4}", summary.pass_rate);
    let rate = if summary.passed == summary.total && summary.total > 0 {
        rate.green().bold()
    } else {
        rate.yellow().bold()
    };
    println!("function-calling eval (pass@1): {rate}");
    println!(
        "{}",
        format!("{} / {} samples passed", summary.passed, summary.total).dimmed()
    );
    emit_machine_event("summary", serde_json::json!(summary));
}

/// `--json` mode: the summary as one JSON document on stdout.
pub fn summary_json(summary: &EvaluationSummary) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string(summary)?);
    Ok(())
}

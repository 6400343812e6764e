use anyhow::{Context, Result, bail};
use std::path::Path;

use tooleval::dataset::{discover_dataset_files, read_samples};
use tooleval::{CompletionFormat, EvalConfig, Evaluator, PreparedSample, run_batch, ui};

mod args;
use args::{CliArgs, USAGE};

fn main() {
    if let Err(e) = run() {
        ui::error(format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    ui::init_logging();

    let cli = CliArgs::parse()?;
    if cli.help {
        println!("{USAGE}");
        return Ok(());
    }
    let Some(dataset) = cli.dataset.as_deref() else {
        bail!("missing --dataset\n\n{USAGE}");
    };

    let mut config = match cli.config.as_deref() {
        Some(path) => EvalConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EvalConfig::load().context("failed to load .tooleval config")?,
    };
    apply_cli_overrides(&mut config, &cli);

    let evaluator = Evaluator::new(config.tags.clone())
        .context("invalid tool-call tags")?
        .with_preference_pairs(config.emit_preference_pairs);
    let format = CompletionFormat {
        chat_template: config.chat_template,
        eos_token: config.eos_token.clone(),
    };

    let samples = load_samples(dataset, &evaluator, &format)?;
    if !cli.quiet && !cli.json_output {
        ui::header(dataset, samples.len());
    }

    let report = run_batch(&evaluator, &samples);
    if !cli.quiet && !cli.json_output {
        for result in &report.results {
            ui::sample_result(result);
        }
    }

    let results_path = config.results_path();
    let pairs_path = config.preference_pairs_path();
    report
        .write(&results_path, &pairs_path)
        .with_context(|| format!("failed to write results to {}", results_path.display()))?;

    let summary = report.summary();
    if cli.json_output {
        ui::summary_json(&summary)?;
        return Ok(());
    }
    if !cli.quiet {
        ui::wrote_file("results", &results_path);
        if !report.preference_pairs.is_empty() {
            ui::wrote_file("preference pairs", &pairs_path);
        }
    }
    ui::summary(&summary);
    Ok(())
}

fn apply_cli_overrides(config: &mut EvalConfig, cli: &CliArgs) {
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(template) = cli.chat_template {
        config.chat_template = template;
    }
    if let Some(token) = &cli.eos_token {
        config.eos_token = Some(token.clone());
    }
    if cli.emit_preference_pairs {
        config.emit_preference_pairs = true;
    }
}

/// Read every dataset file and prepare its records. Invalid samples are reported and skipped.
fn load_samples(
    dataset: &Path,
    evaluator: &Evaluator,
    format: &CompletionFormat,
) -> Result<Vec<PreparedSample>> {
    let files = discover_dataset_files(dataset)
        .with_context(|| format!("failed to read dataset {}", dataset.display()))?;
    if files.is_empty() {
        bail!("no .jsonl files under {}", dataset.display());
    }

    let mut samples = Vec::new();
    for file in files {
        let records =
            read_samples(&file).with_context(|| format!("failed to read {}", file.display()))?;
        for record in records {
            let index = samples.len();
            match record.prepare(index, evaluator, format) {
                Ok(sample) => samples.push(sample),
                Err(e) => ui::warn(format!("{}: skipping sample {index}: {e}", file.display())),
            }
        }
    }
    Ok(samples)
}

use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

use tooleval::ChatTemplate;

#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub dataset: Option<PathBuf>,             // -d/--dataset
    pub output_dir: Option<PathBuf>,          // -o/--output
    pub config: Option<PathBuf>,              // --config
    pub chat_template: Option<ChatTemplate>,  // --chat-template
    pub eos_token: Option<String>,            // --eos-token
    pub emit_preference_pairs: bool,          // --dpo
    pub quiet: bool,                          // -q/--quiet
    pub json_output: bool,                    // --json
    pub help: bool,                           // -h/--help
}

pub const USAGE: &str = "\
usage: tooleval -d <dataset> [options]

  -d, --dataset <path>          JSONL file, or directory walked for *.jsonl
  -o, --output <dir>            directory for results and preference pairs
      --config <path>           config file (.json or .yaml)
      --chat-template <name>    chatml | llama3 | raw
      --eos-token <token>       token stripped from completions
      --dpo                     write preference pairs for failed samples
  -q, --quiet                   only print the summary
      --json                    print the summary as JSON
  -h, --help                    show this message";

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        Self::parse_from(&args[1..])
    }

    /// Parse from a slice of arguments (for testing)
    pub fn parse_from(args: &[String]) -> Result<Self> {
        let mut result = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                "-d" | "--dataset" => {
                    result.dataset = Some(PathBuf::from(value_of(args, &mut i)?));
                }
                "-o" | "--output" => {
                    result.output_dir = Some(PathBuf::from(value_of(args, &mut i)?));
                }
                "--config" => {
                    result.config = Some(PathBuf::from(value_of(args, &mut i)?));
                }
                "--chat-template" => {
                    result.chat_template = Some(value_of(args, &mut i)?.parse()?);
                }
                "--eos-token" => {
                    result.eos_token = Some(value_of(args, &mut i)?.to_string());
                }
                "--dpo" => {
                    result.emit_preference_pairs = true;
                }
                "-q" | "--quiet" => {
                    result.quiet = true;
                }
                "--json" => {
                    result.json_output = true;
                }
                "-h" | "--help" => {
                    result.help = true;
                }
                unknown => {
                    return Err(anyhow!("Unknown argument: {unknown}"));
                }
            }

            i += 1;
        }

        Ok(result)
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

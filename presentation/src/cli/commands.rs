//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weaver_domain::OutputFormat;

/// CLI arguments for code-weaver
#[derive(Parser, Debug)]
#[command(name = "code-weaver")]
#[command(author, version, about = "Route coding requests through explain, generate, review and test agents")]
#[command(long_about = r#"
code-weaver classifies each request and runs only the agents it needs:

1. Routing:      a safety gate, then a classifier picks EXPLAIN / GENERATE / DECOMPOSE
2. Phase A:      EXPLAIN and GENERATE run in parallel
3. Phase B:      CRITIC and DEFENDER review generated code, a CONTROLLER decides
4. Phase C:      generated tests run against the code, repairing up to 4 times

Configuration files are loaded from (in priority order):
1. WEAVER_* environment variables (e.g. WEAVER_PIPELINE__MAX_RETRIES=2)
2. --config <path>     Explicit config file
3. ./weaver.toml       Project-level config
4. ~/.config/code-weaver/config.toml   Global config

Example:
  code-weaver ask "How does the retry backoff work?"
  code-weaver ask --attach src/db.rs "Add connection pooling to the database layer"
  code-weaver route "Write a function that parses ISO dates"
  code-weaver evaluate --request "Parse ISO dates" --file src/date.rs
  code-weaver refine "Implement a bounded LRU cache"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (default: summary)
    #[arg(short, long, global = true, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Attach a file to the request (can be specified multiple times)
    #[arg(long, global = true, value_name = "PATH")]
    pub attach: Vec<PathBuf>,

    /// Repository root used for context (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Write daily-rotated log files to this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the full pipeline on a request
    Ask {
        /// The question or change request
        query: String,
    },

    /// Classify a request and print the route without running it
    Route {
        /// The request to classify
        query: String,
    },

    /// Review existing files with CRITIC and DEFENDER, then decide
    Evaluate {
        /// What the code is supposed to do
        #[arg(long)]
        request: String,

        /// Files to review (can be specified multiple times)
        #[arg(long = "file", value_name = "PATH", required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate code and repair it until its generated tests pass
    Refine {
        /// The change request
        request: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_globals() {
        let cli = Cli::try_parse_from([
            "code-weaver",
            "-vv",
            "ask",
            "--output",
            "json",
            "--attach",
            "src/db.rs",
            "Add pooling",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.attach, vec![PathBuf::from("src/db.rs")]);
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                query: "Add pooling".to_string()
            })
        );
    }

    #[test]
    fn test_evaluate_requires_files() {
        assert!(Cli::try_parse_from(["code-weaver", "evaluate", "--request", "x"]).is_err());

        let cli = Cli::try_parse_from([
            "code-weaver",
            "evaluate",
            "--request",
            "Parse dates",
            "--file",
            "a.rs",
            "--file",
            "b.rs",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Evaluate { request, files }) => {
                assert_eq!(request, "Parse dates");
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_show_config_without_command() {
        let cli = Cli::try_parse_from(["code-weaver", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_invalid_output_format() {
        assert!(Cli::try_parse_from(["code-weaver", "--output", "xml", "route", "q"]).is_err());
    }
}

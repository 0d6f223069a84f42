use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "factcheck",
    version,
    about = "Submit claims to a fact-check service and watch its dashboard"
)]
pub struct Cli {
    /// RON config file (defaults to ./checker.ron when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory for reports and the persisted state file.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Also write logs to a file (checker.log when no path is given).
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        default_missing_value = checker_logging::DEFAULT_LOG_FILE
    )]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a claim, a URL or an image and wait for the verdict.
    Check {
        /// Claim text or URL; several words are joined with spaces.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,

        /// Image to upload instead of the text.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Download the full report once the check completes.
        #[arg(long)]
        report: bool,
    },
    /// Download the report of a submission (default: the last one).
    Report { id: Option<String> },
    /// Refresh the dashboard periodically until interrupted.
    Dashboard {
        /// Stop after this many refresh cycles.
        #[arg(long)]
        cycles: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_joins_free_text_and_keeps_flags() {
        let cli = Cli::parse_from([
            "factcheck",
            "-vv",
            "check",
            "--file",
            "meme.png",
            "Bananas",
            "are",
            "radioactive",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Check { text, file, report } => {
                assert_eq!(text.join(" "), "Bananas are radioactive");
                assert_eq!(file, Some(PathBuf::from("meme.png")));
                assert!(!report);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "factcheck",
            "dashboard",
            "--cycles",
            "2",
            "--base-url",
            "http://api.local:9000",
        ]);
        assert_eq!(cli.base_url.as_deref(), Some("http://api.local:9000"));
        assert!(matches!(cli.command, Command::Dashboard { cycles: Some(2) }));
    }

    #[test]
    fn bare_log_file_flag_uses_default_name() {
        let cli = Cli::parse_from(["factcheck", "report", "abc", "--log-file"]);
        assert_eq!(
            cli.log_file,
            Some(PathBuf::from(checker_logging::DEFAULT_LOG_FILE))
        );
        assert!(matches!(cli.command, Command::Report { id: Some(ref id) } if id == "abc"));
    }
}

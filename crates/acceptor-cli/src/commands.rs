//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Acceptor: run storefront and booking API feature files
#[derive(Parser, Debug)]
#[command(name = "acceptor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run feature files
    ///
    /// Browser scenarios (tagged @ui) only run when RUN_UI_TESTS is set;
    /// otherwise they are reported as skipped.
    Run(RunArgs),

    /// Parse feature files and report steps with no definition
    Check(CheckArgs),

    /// List the registered step phrases
    Steps(StepsArgs),

    /// Serve the in-process booking API stub
    Stub(StubArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Feature files or directories to search for `.feature` files
    #[arg(default_value = "features")]
    pub paths: Vec<PathBuf>,

    /// Tag expression; repeat to AND, comma-separate to OR (e.g. `@api,@ui`, `~@slow`)
    #[arg(short, long = "tags")]
    pub tags: Vec<String>,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Match every step without executing any
    #[arg(long)]
    pub dry_run: bool,

    /// Directory holding the JSON schemas
    #[arg(long)]
    pub schemas: Option<PathBuf>,

    /// Booking API base URL (overrides BASE_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Storefront URL (overrides STORE_URL)
    #[arg(long)]
    pub store_url: Option<String>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Feature files or directories to search for `.feature` files
    #[arg(default_value = "features")]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the steps command
#[derive(Parser, Debug)]
pub struct StepsArgs {
    /// Only list one group
    #[arg(short, long)]
    pub group: Option<GroupArg>,
}

/// Arguments for the stub command
#[derive(Parser, Debug)]
pub struct StubArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    pub port: u16,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable summary
    #[default]
    Text,
    /// Full report as JSON on stdout
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Step group argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupArg {
    /// Browser steps
    Ui,
    /// Booking API steps
    Api,
}

impl From<GroupArg> for acceptor::steps::StepGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Ui => Self::Ui,
            GroupArg::Api => Self::Api,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_defaults() {
            let cli = Cli::parse_from(["acceptor", "run"]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.paths, vec![PathBuf::from("features")]);
                assert!(args.tags.is_empty());
                assert_eq!(args.format, FormatArg::Text);
                assert!(!args.fail_fast);
                assert!(!args.dry_run);
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_with_tags() {
            let cli = Cli::parse_from([
                "acceptor", "run", "--tags", "@api", "-t", "~@slow", "api.feature",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.tags, vec!["@api", "~@slow"]);
                assert_eq!(args.paths, vec![PathBuf::from("api.feature")]);
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_json_dry_run() {
            let cli = Cli::parse_from(["acceptor", "run", "--format", "json", "--dry-run"]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.format, FormatArg::Json);
                assert!(args.dry_run);
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_overrides() {
            let cli = Cli::parse_from([
                "acceptor",
                "run",
                "--api-url",
                "http://localhost:9000",
                "--schemas",
                "contracts",
                "--fail-fast",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.api_url.as_deref(), Some("http://localhost:9000"));
                assert_eq!(args.schemas, Some(PathBuf::from("contracts")));
                assert!(args.fail_fast);
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_steps_group() {
            let cli = Cli::parse_from(["acceptor", "steps", "--group", "api"]);
            if let Commands::Steps(args) = cli.command {
                assert_eq!(args.group, Some(GroupArg::Api));
            } else {
                panic!("expected Steps command");
            }
        }

        #[test]
        fn test_parse_stub_port() {
            let cli = Cli::parse_from(["acceptor", "stub", "-p", "8080"]);
            if let Commands::Stub(args) = cli.command {
                assert_eq!(args.port, 8080);
                assert_eq!(args.host, "127.0.0.1");
            } else {
                panic!("expected Stub command");
            }
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["acceptor", "-vv", "--color", "never", "check"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
            assert!(matches!(cli.command, Commands::Check(_)));
        }

        #[test]
        fn test_unknown_format_rejected() {
            assert!(Cli::try_parse_from(["acceptor", "run", "--format", "xml"]).is_err());
        }
    }

    mod conversion_tests {
        use super::*;
        use crate::config::ColorChoice;
        use crate::output::OutputFormat;
        use acceptor::steps::StepGroup;

        #[test]
        fn test_color_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }

        #[test]
        fn test_format_conversion() {
            assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        }

        #[test]
        fn test_group_conversion() {
            assert_eq!(StepGroup::from(GroupArg::Ui), StepGroup::Ui);
        }
    }
}

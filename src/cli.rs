//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for persona-digest.

use clap::{Parser, Subcommand};

use crate::persona::PersonaMode;

/// persona-digest - persona-styled article summaries
///
/// Generates short summaries of markdown articles in the voice of several
/// characters, then publishes them into an index document, an HTML gallery
/// and a static JSON API.
#[derive(Parser, Debug)]
#[command(name = "persona-digest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate persona summaries for a directory of articles
    Generate {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,

        /// Persona selection mode (fixed, single, dynamic, mixed)
        #[arg(short, long)]
        mode: Option<PersonaMode>,

        /// Personas per article in dynamic and mixed modes
        #[arg(short, long)]
        personas: Option<usize>,

        /// Articles processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Maximum number of articles to process
        #[arg(short, long, conflicts_with = "all")]
        limit: Option<usize>,

        /// Process every article (ignores the configured limit)
        #[arg(long)]
        all: bool,

        /// Root directory scanned for markdown articles
        #[arg(short, long)]
        input: Option<String>,

        /// Directory receiving the summary records
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Append persona summaries to the matching sections of an index document
    MergeIndex {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,

        /// Index document to update
        #[arg(long)]
        index: Option<String>,

        /// Summary directory to aggregate (repeatable, replaces the configured list)
        #[arg(short, long = "dir")]
        dirs: Vec<String>,

        /// Print the merged document instead of rewriting the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Render the HTML gallery
    Gallery {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,

        /// Output HTML file
        #[arg(short, long)]
        output: Option<String>,

        /// Summary directory to aggregate (repeatable, replaces the configured list)
        #[arg(short, long = "dir")]
        dirs: Vec<String>,
    },

    /// Export the static JSON API
    ExportApi {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<String>,

        /// Summary directory to aggregate (repeatable, replaces the configured list)
        #[arg(short, long = "dir")]
        dirs: Vec<String>,
    },

    /// List every persona found in the summary records
    Personas {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,

        /// Summary directory to aggregate (repeatable, replaces the configured list)
        #[arg(short, long = "dir")]
        dirs: Vec<String>,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration (API key masked)
    Show {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long, env = "PERSONA_DIGEST_CONFIG")]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["persona-digest", "generate"]);
        match cli.command {
            Commands::Generate {
                mode,
                personas,
                limit,
                all,
                ..
            } => {
                assert!(mode.is_none());
                assert!(personas.is_none());
                assert!(limit.is_none());
                assert!(!all);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let cli = Cli::parse_from([
            "persona-digest",
            "generate",
            "--mode",
            "mixed",
            "--personas",
            "4",
            "--workers",
            "3",
            "--limit",
            "10",
            "--input",
            "blogs",
        ]);
        match cli.command {
            Commands::Generate {
                mode,
                personas,
                workers,
                limit,
                input,
                ..
            } => {
                assert_eq!(mode, Some(PersonaMode::Mixed));
                assert_eq!(personas, Some(4));
                assert_eq!(workers, Some(3));
                assert_eq!(limit, Some(10));
                assert_eq!(input.as_deref(), Some("blogs"));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["persona-digest", "generate", "--mode", "random"]).is_err());
    }

    #[test]
    fn test_limit_conflicts_with_all() {
        assert!(Cli::try_parse_from(["persona-digest", "generate", "--all", "--limit", "3"]).is_err());
    }

    #[test]
    fn test_merge_index_dirs() {
        let cli = Cli::parse_from([
            "persona-digest",
            "merge-index",
            "--dir",
            "a",
            "--dir",
            "b",
            "--dry-run",
        ]);
        match cli.command {
            Commands::MergeIndex { dirs, dry_run, index, .. } => {
                assert_eq!(dirs, ["a", "b"]);
                assert!(dry_run);
                assert!(index.is_none());
            }
            _ => panic!("Expected MergeIndex command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["persona-digest", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["persona-digest", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["persona-digest", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}

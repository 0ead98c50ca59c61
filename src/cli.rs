// CLI module for argument parsing and configuration

use crate::config::UserConfig;
use crate::domain::{AssetId, SortStrategy};
use crate::persist::JsonFileStore;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Snapsweep - reclaim storage by clearing out old screenshots
///
/// Review the screenshots in a photo library, protect the ones worth keeping,
/// and move the rest to the trash.
#[derive(Parser, Debug, Clone)]
#[command(name = "snapsweep")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Photo library folder (defaults to the configured library, then the
    /// platform pictures folder)
    #[arg(short = 'l', long = "library", global = true)]
    pub library: Option<PathBuf>,

    /// State file holding protected assets and the reclaimed-bytes total
    #[arg(long = "state", global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List screenshots that are candidates for deletion
    Scan {
        /// Order of the review list
        #[arg(short = 's', long = "sort", value_enum)]
        sort: Option<SortOrder>,

        /// Show at most this many candidates
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },

    /// Toggle protection for one or more assets
    Protect {
        /// Asset ids as printed by `scan`
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List protected assets, dropping ones that no longer exist
    Vault,

    /// Move selected screenshots to the trash
    Delete {
        /// Asset ids to delete
        ids: Vec<String>,

        /// Delete every candidate
        #[arg(short = 'a', long = "all", action = ArgAction::SetTrue, conflicts_with = "ids")]
        all: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
        yes: bool,

        /// Show what would be deleted without deleting anything
        #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
        dry_run: bool,
    },

    /// Show storage usage and the lifetime reclaimed total
    Stats,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Most recent first; undated screenshots last
    Newest,
    /// Oldest first; undated screenshots first
    Oldest,
    /// Largest file first
    Largest,
}

impl From<SortOrder> for SortStrategy {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Newest => SortStrategy::Newest,
            SortOrder::Oldest => SortStrategy::Oldest,
            SortOrder::Largest => SortStrategy::Largest,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref library) = self.library {
            if !library.is_dir() {
                return Err(format!(
                    "Library is not a directory: {}",
                    library.display()
                ));
            }
        }

        if let Command::Delete { ids, all, .. } = &self.command {
            if ids.is_empty() && !all {
                return Err("Nothing to delete: pass asset ids or --all".to_string());
            }
        }

        if let Command::Scan { limit: Some(0), .. } = &self.command {
            return Err("--limit must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments and saved preferences
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub library: PathBuf,
    pub state_file: PathBuf,
    pub default_sort: SortStrategy,
    pub command: Command,
}

impl AppConfig {
    /// Command-line values win over saved preferences, which win over
    /// platform defaults.
    pub fn resolve(args: Args, user_config: &UserConfig) -> Result<Self, String> {
        let library = args
            .library
            .or_else(|| user_config.library_dir())
            .ok_or_else(|| "Could not determine a photo library; pass --library".to_string())?;

        let state_file = args
            .state
            .or_else(|| user_config.state_file.clone())
            .or_else(JsonFileStore::default_path)
            .ok_or_else(|| "Could not determine a state file location; pass --state".to_string())?;

        Ok(AppConfig {
            library,
            state_file,
            default_sort: user_config.default_sort,
            command: args.command,
        })
    }
}

/// Asks on the terminal before a batch goes to the trash
pub fn prompt_confirmation(ids: &[AssetId]) -> bool {
    let mut stdout = io::stdout();
    let noun = if ids.len() == 1 { "item" } else { "items" };
    if write!(stdout, "Move {} {} to the trash? [y/N] ", ids.len(), noun).is_err()
        || stdout.flush().is_err()
    {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_affirmative(&answer)
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod args_tests {
        use super::*;

        #[test]
        fn test_parse_scan_with_sort() {
            let args = Args::try_parse_from(["snapsweep", "scan", "--sort", "largest"]).unwrap();
            assert_eq!(
                args.command,
                Command::Scan {
                    sort: Some(SortOrder::Largest),
                    limit: None
                }
            );
            assert!(args.library.is_none());
        }

        #[test]
        fn test_parse_global_library_after_subcommand() {
            let args =
                Args::try_parse_from(["snapsweep", "stats", "--library", "/photos"]).unwrap();
            assert_eq!(args.library, Some(PathBuf::from("/photos")));
            assert_eq!(args.command, Command::Stats);
        }

        #[test]
        fn test_parse_protect_requires_ids() {
            assert!(Args::try_parse_from(["snapsweep", "protect"]).is_err());
            let args = Args::try_parse_from(["snapsweep", "protect", "a.png", "b.png"]).unwrap();
            assert_eq!(
                args.command,
                Command::Protect {
                    ids: vec!["a.png".to_string(), "b.png".to_string()]
                }
            );
        }

        #[test]
        fn test_parse_delete_flags() {
            let args =
                Args::try_parse_from(["snapsweep", "delete", "--all", "--yes", "--dry-run"])
                    .unwrap();
            assert_eq!(
                args.command,
                Command::Delete {
                    ids: vec![],
                    all: true,
                    yes: true,
                    dry_run: true
                }
            );
        }

        #[test]
        fn test_delete_all_conflicts_with_ids() {
            assert!(Args::try_parse_from(["snapsweep", "delete", "--all", "a.png"]).is_err());
        }

        #[test]
        fn test_sort_order_conversion() {
            assert_eq!(SortStrategy::from(SortOrder::Newest), SortStrategy::Newest);
            assert_eq!(SortStrategy::from(SortOrder::Oldest), SortStrategy::Oldest);
            assert_eq!(SortStrategy::from(SortOrder::Largest), SortStrategy::Largest);
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_validate_delete_needs_targets() {
            let args = Args::try_parse_from(["snapsweep", "delete"]).unwrap();
            assert!(args.validate().is_err());
        }

        #[test]
        fn test_validate_missing_library() {
            let temp_dir = TempDir::new().unwrap();
            let missing = temp_dir.path().join("missing");
            let args = Args::try_parse_from([
                "snapsweep",
                "scan",
                "--library",
                missing.to_str().unwrap(),
            ])
            .unwrap();
            assert!(args.validate().is_err());
        }

        #[test]
        fn test_validate_zero_limit() {
            let args = Args::try_parse_from(["snapsweep", "scan", "-n", "0"]).unwrap();
            assert!(args.validate().is_err());
        }

        #[test]
        fn test_validate_ok() {
            let temp_dir = TempDir::new().unwrap();
            let args = Args::try_parse_from([
                "snapsweep",
                "delete",
                "x.png",
                "--library",
                temp_dir.path().to_str().unwrap(),
            ])
            .unwrap();
            assert!(args.validate().is_ok());
        }
    }

    mod app_config_tests {
        use super::*;

        #[test]
        fn test_resolve_prefers_arguments() {
            let args = Args::try_parse_from([
                "snapsweep",
                "vault",
                "--library",
                "/cli/photos",
                "--state",
                "/cli/state.json",
            ])
            .unwrap();
            let user_config = UserConfig {
                default_sort: SortStrategy::Oldest,
                library: Some(PathBuf::from("/saved/photos")),
                state_file: Some(PathBuf::from("/saved/state.json")),
            };

            let config = AppConfig::resolve(args, &user_config).unwrap();

            assert_eq!(config.library, PathBuf::from("/cli/photos"));
            assert_eq!(config.state_file, PathBuf::from("/cli/state.json"));
            assert_eq!(config.default_sort, SortStrategy::Oldest);
            assert_eq!(config.command, Command::Vault);
        }

        #[test]
        fn test_resolve_falls_back_to_saved_preferences() {
            let args = Args::try_parse_from(["snapsweep", "stats"]).unwrap();
            let user_config = UserConfig {
                default_sort: SortStrategy::Newest,
                library: Some(PathBuf::from("/saved/photos")),
                state_file: Some(PathBuf::from("/saved/state.json")),
            };

            let config = AppConfig::resolve(args, &user_config).unwrap();

            assert_eq!(config.library, PathBuf::from("/saved/photos"));
            assert_eq!(config.state_file, PathBuf::from("/saved/state.json"));
        }
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("nope"));
    }
}

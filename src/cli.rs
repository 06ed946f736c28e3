use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Missing {0}. Usage: chipmunk-search [--json] [--all] [filters.json] <log-file>")]
    Missing(&'static str),

    #[error("Unexpected argument: {0}")]
    Unexpected(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

/// Options parsed from command line arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub json: bool,
    pub include_disabled: bool,
    /// Falls back to `CHIPMUNK_STORAGE_FILE` when absent
    pub storage: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl CliOptions {
    /// Parse command line arguments
    /// Format: chipmunk-search [options] [filters.json] <log-file>
    /// Options:
    ///   --json  Print results as JSON
    ///   --all   Also run disabled and inactive filters
    pub fn from_args() -> Result<Self, CliError> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    /// Parse from a given argument list
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut json = false;
        let mut include_disabled = false;
        let mut positional = Vec::new();

        for arg in args.iter().skip(1) {
            match arg.as_str() {
                "--json" => json = true,
                "--all" => include_disabled = true,
                opt if opt.starts_with("--") => {
                    return Err(CliError::UnknownOption(opt.to_string()));
                }
                path => positional.push(PathBuf::from(path)),
            }
        }

        let (storage, log_file) = match positional.len() {
            0 => return Err(CliError::Missing("log file")),
            1 => (None, positional.remove(0)),
            2 => {
                let log_file = positional.remove(1);
                (Some(positional.remove(0)), log_file)
            }
            _ => return Err(CliError::Unexpected(positional[2].display().to_string())),
        };

        tracing::info!(
            "Parsed CLI options: storage={:?}, log={}, json={json}, all={include_disabled}",
            storage,
            log_file.display()
        );

        Ok(Self {
            json,
            include_disabled,
            storage,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_paths() {
        let opts = CliOptions::parse(&args(&["chipmunk-search", "f.json", "trace.log"])).unwrap();
        assert_eq!(opts.storage, Some(PathBuf::from("f.json")));
        assert_eq!(opts.log_file, PathBuf::from("trace.log"));
        assert!(!opts.json);
        assert!(!opts.include_disabled);
    }

    #[test]
    fn test_parse_with_options() {
        let opts = CliOptions::parse(&args(&[
            "chipmunk-search",
            "--json",
            "f.json",
            "--all",
            "trace.log",
        ]))
        .unwrap();
        assert!(opts.json);
        assert!(opts.include_disabled);
    }

    #[test]
    fn test_parse_single_path_is_log_file() {
        let opts = CliOptions::parse(&args(&["chipmunk-search", "trace.log"])).unwrap();
        assert_eq!(opts.storage, None);
        assert_eq!(opts.log_file, PathBuf::from("trace.log"));
    }

    #[test]
    fn test_parse_missing_log_file() {
        assert_eq!(
            CliOptions::parse(&args(&["chipmunk-search", "--json"])),
            Err(CliError::Missing("log file"))
        );
    }

    #[test]
    fn test_parse_too_many_paths() {
        assert_eq!(
            CliOptions::parse(&args(&["chipmunk-search", "a", "b", "c"])),
            Err(CliError::Unexpected("c".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_option() {
        assert_eq!(
            CliOptions::parse(&args(&["chipmunk-search", "--verbose", "a", "b"])),
            Err(CliError::UnknownOption("--verbose".to_string()))
        );
    }
}

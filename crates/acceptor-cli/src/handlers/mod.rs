//! Command handlers - extracted from main.rs for testability

pub mod check;
pub mod run;
pub mod stub;

use std::path::PathBuf;

use acceptor::gherkin::parse_file;
use acceptor::Feature;
use tracing::debug;

use crate::error::{CliError, CliResult};

pub use check::{execute_check, execute_steps, list_phrases, undefined_steps};
pub use run::{apply_overrides, execute_run};
pub use stub::{bind_address, execute_stub};

/// Expand files and directories into `.feature` files.
///
/// Directories are searched recursively; each directory's files are
/// sorted, and the given order of arguments is kept.
pub fn discover_features(paths: &[PathBuf]) -> CliResult<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_file() {
            found.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(CliError::invalid_argument(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let pattern = format!(
            "{}/**/*.feature",
            glob::Pattern::escape(&path.to_string_lossy())
        );
        let entries =
            glob::glob(&pattern).map_err(|e| CliError::invalid_argument(e.to_string()))?;
        let mut files = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CliError::Io(e.into_error()))?;
        files.sort();
        for file in files {
            if !found.contains(&file) {
                found.push(file);
            }
        }
    }
    Ok(found)
}

/// Discover and parse feature files; fails if none are found
pub fn load_features(paths: &[PathBuf]) -> CliResult<Vec<Feature>> {
    let files = discover_features(paths)?;
    if files.is_empty() {
        return Err(CliError::invalid_argument("no feature files found"));
    }
    files
        .iter()
        .map(|file| {
            debug!(path = %file.display(), "parsing feature file");
            parse_file(file).map_err(CliError::from)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FEATURE: &str = "Feature: Ping\n  Scenario: Healthy\n    Given the booking service is healthy\n";

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("api/nested")).unwrap();
        fs::write(dir.path().join("b.feature"), FEATURE).unwrap();
        fs::write(dir.path().join("a.feature"), FEATURE).unwrap();
        fs::write(dir.path().join("api/nested/c.feature"), FEATURE).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a feature").unwrap();
        dir
    }

    #[test]
    fn test_directory_is_searched_recursively_and_sorted() {
        let dir = tree();
        let files = discover_features(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.feature"),
                PathBuf::from("api/nested/c.feature"),
                PathBuf::from("b.feature"),
            ]
        );
    }

    #[test]
    fn test_explicit_file_is_kept_once() {
        let dir = tree();
        let file = dir.path().join("b.feature");
        let files = discover_features(&[file.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], file);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let err = discover_features(&[PathBuf::from("/no/such/features")]).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_load_parses_every_file() {
        let dir = tree();
        let features = load_features(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(features.len(), 3);
        assert!(features.iter().all(|f| f.name == "Ping"));
    }

    #[test]
    fn test_load_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load_features(&[dir.path().to_path_buf()]).is_err());
    }
}

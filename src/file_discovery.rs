use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Finds rotated access-log files in a directory
pub struct FileDiscovery {
    name_contains: String,
}

impl FileDiscovery {
    pub fn new(name_contains: impl Into<String>) -> Self {
        Self {
            name_contains: name_contains.into(),
        }
    }

    /// Files directly inside `dir` whose name contains the configured substring, sorted by name
    pub fn find_access_logs(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*{}*",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(&self.name_contains)
        );

        let mut files: Vec<PathBuf> = glob(&pattern)
            .with_context(|| format!("Invalid access log pattern: {}", pattern))?
            .flatten()
            .filter(|path| path.is_file())
            .collect();

        files.sort();
        tracing::debug!(dir = %dir.display(), found = files.len(), "Discovered access logs");
        Ok(files)
    }

    /// Explicit paths first, then discovered ones not already listed
    pub fn merge(explicit: Vec<PathBuf>, discovered: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        explicit
            .into_iter()
            .chain(discovered)
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_finds_only_matching_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("localhost_access_log.2023-01-02.txt"), "").unwrap();
        fs::write(dir.path().join("localhost_access_log.2023-01-01.txt"), "").unwrap();
        fs::write(dir.path().join("catalina.2023-01-01.log"), "").unwrap();
        fs::create_dir(dir.path().join("localhost_access_log.d")).unwrap();

        let files = FileDiscovery::new("localhost_access_log")
            .find_access_logs(dir.path())
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "localhost_access_log.2023-01-01.txt",
                "localhost_access_log.2023-01-02.txt"
            ]
        );
    }

    #[test]
    fn test_merge_deduplicates() {
        let merged = FileDiscovery::merge(
            vec![PathBuf::from("b.log"), PathBuf::from("a.log")],
            vec![PathBuf::from("a.log"), PathBuf::from("c.log")],
        );
        assert_eq!(
            merged,
            vec![
                PathBuf::from("b.log"),
                PathBuf::from("a.log"),
                PathBuf::from("c.log")
            ]
        );
    }
}

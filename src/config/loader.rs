//! Pipeline configuration loading from disk or inline text.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Input section used when an inline config declares none.
pub const DEFAULT_INPUT: &str = "input { stdin { type => \"stdin\" } }\n";

/// Output section used when an inline config declares none.
pub const DEFAULT_OUTPUT: &str = "output { stdout { codec => rubydebug } }\n";

/// Error type for configuration loading and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no configuration found at {}", .0.display())]
    Empty(PathBuf),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Assembles the pipeline configuration text from `config.path` and
/// `config.string`.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Produce the effective configuration text.
    ///
    /// With a path, the inline string (if any) is followed by the file
    /// contents. Without one, default stdin/stdout sections are appended
    /// when the inline string lacks them.
    pub fn format_config(&self, path: Option<&Path>, inline: Option<&str>) -> Result<String, ConfigError> {
        let mut config = inline.unwrap_or_default().to_string();

        match path {
            Some(path) => {
                if !config.is_empty() && !config.ends_with('\n') {
                    config.push('\n');
                }
                config.push_str(&self.load_path(path)?);
            }
            None => {
                if !has_section(&config, "input") {
                    config.push_str(DEFAULT_INPUT);
                }
                if !has_section(&config, "output") {
                    config.push_str(DEFAULT_OUTPUT);
                }
            }
        }

        Ok(config)
    }

    /// Read a single file, or every regular file of a directory in name order.
    pub fn load_path(&self, path: &Path) -> Result<String, ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if !path.is_dir() {
            return fs::read_to_string(path).map_err(io_err);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }

        let mut config = String::new();
        for file in files {
            tracing::debug!(path = %file.display(), "Reading config file");
            let content = fs::read_to_string(&file).map_err(|source| ConfigError::Io {
                path: file.clone(),
                source,
            })?;
            config.push_str(&content);
            if !content.ends_with('\n') {
                config.push('\n');
            }
        }
        Ok(config)
    }
}

/// Matches `<name> {` with any spacing, outside comments.
fn has_section(config: &str, name: &str) -> bool {
    config.lines().any(|line| {
        let code = line.split('#').next().unwrap_or_default();
        code.match_indices(name).any(|(i, _)| {
            let before = code[..i].chars().next_back();
            let boundary = before.map_or(true, |c| !c.is_alphanumeric() && c != '_');
            boundary && code[i + name.len()..].trim_start().starts_with('{')
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_gets_default_sections() {
        let loader = ConfigLoader::new();
        let config = loader.format_config(None, Some("filter { mutate {} }")).unwrap();
        assert!(config.starts_with("filter { mutate {} }"));
        assert!(config.contains(DEFAULT_INPUT));
        assert!(config.contains(DEFAULT_OUTPUT));

        let config = loader
            .format_config(None, Some("input { generator {} }\noutput  { null {} }"))
            .unwrap();
        assert!(!config.contains(DEFAULT_INPUT));
        assert!(!config.contains(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_path_appended_after_inline() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.conf");
        fs::write(&file, "output { null {} }").unwrap();

        let config = ConfigLoader::new()
            .format_config(Some(&file), Some("input { generator {} }"))
            .unwrap();
        assert_eq!(config, "input { generator {} }\noutput { null {} }");
    }

    #[test]
    fn test_directory_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20-out.conf"), "output { null {} }").unwrap();
        fs::write(dir.path().join("10-in.conf"), "input { generator {} }\n").unwrap();

        let config = ConfigLoader::new().load_path(dir.path()).unwrap();
        assert_eq!(config, "input { generator {} }\noutput { null {} }\n");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new().load_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn test_section_detection() {
        assert!(has_section("input{}", "input"));
        assert!(!has_section("# input { }", "input"));
        assert!(!has_section("myinput { }", "input"));
    }
}

//! Configuration loading from disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::node::ConfigNode;
use crate::error::ConfigError;

/// File names tried in each search directory, in order.
const CONFIG_FILES: [&str; 2] = ["config.toml", "config.json"];

/// Load a configuration snapshot from a TOML or JSON file.
///
/// The format follows the extension; files without a known extension are
/// tried as TOML first, then JSON.
pub fn load_snapshot(path: &Path) -> Result<ConfigNode, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigNode::from_toml(&content),
        Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigNode::from_json(&content),
        _ => ConfigNode::from_toml(&content).or_else(|_| ConfigNode::from_json(&content)),
    }
}

/// Directories searched for the configuration of the application `name`.
///
/// `$CONFIG_PATH` (a platform path list) replaces the defaults entirely.
pub fn search_paths(name: &str) -> Vec<PathBuf> {
    if let Some(paths) = env::var_os("CONFIG_PATH").filter(|p| !p.is_empty()) {
        return env::split_paths(&paths).collect();
    }

    let norm = name.to_lowercase();
    let mut paths = Vec::with_capacity(4);
    if let Some(home) = env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join(&norm));
    }
    paths.push(PathBuf::from("/etc").join(&norm));
    paths.push(PathBuf::from("etc"));
    paths.push(PathBuf::from("."));
    paths
}

/// Find the first configuration file for `name` in `dirs`.
pub fn find_config_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILES.iter().map(move |file| dir.join(file)))
        .find(|candidate| candidate.is_file())
}

/// Discover and load the configuration for `name`.
///
/// Returns `Ok(None)` when no file exists anywhere in the search path; a file
/// that exists but does not parse is an error.
pub fn discover(name: &str) -> Result<Option<(PathBuf, ConfigNode)>, ConfigError> {
    let Some(path) = find_config_file(&search_paths(name)) else {
        tracing::debug!(app = %name, "no configuration file found, using defaults");
        return Ok(None);
    };
    let snapshot = load_snapshot(&path)?;
    tracing::info!(path = %path.display(), "configuration loaded");
    Ok(Some((path, snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = write_file(dir.path(), "app.toml", "[logging.root]\nlevel = \"debug\"\n");
        let json_path = write_file(dir.path(), "app.json", r#"{"name": "some value"}"#);

        let node = load_snapshot(&toml_path).unwrap();
        assert_eq!(node.get_str("logging.root.level"), Some("debug"));

        let node = load_snapshot(&json_path).unwrap();
        assert_eq!(node.get_str("name"), Some("some value"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "config.json", "{]}");
        assert!(matches!(load_snapshot(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_snapshot(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_find_config_file_prefers_earlier_dirs() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_file(second.path(), "config.json", r#"{"name": "second"}"#);

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = find_config_file(&dirs).unwrap();
        assert!(found.starts_with(second.path()));

        write_file(first.path(), "config.toml", "name = \"first\"\n");
        let found = find_config_file(&dirs).unwrap();
        assert!(found.starts_with(first.path()));
    }
}

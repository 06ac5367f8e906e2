//! Minimal `.env` support so `GEMINI_API_KEY` can live next to the config.

use std::path::{Path, PathBuf};

/// Parse `KEY=VALUE` lines. Comments and blank lines are skipped, values
/// may be wrapped in single or double quotes.
pub fn parse(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Load the first `.env` found in the working directory or beside the
/// config file. Variables already set in the environment win.
pub fn load(config_path: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(dir) = config_path.and_then(Path::parent) {
        candidates.push(dir.join(".env"));
    }

    for path in candidates {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        for (key, value) in parse(&contents) {
            if std::env::var_os(&key).is_none() {
                std::env::set_var(key, value);
            }
        }
        return Some(path);
    }
    None
}

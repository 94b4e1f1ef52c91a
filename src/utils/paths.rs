use crate::constants::{credentials, env};
use std::path::{Path, PathBuf};

fn normalize_env_path(value: Option<String>) -> Option<PathBuf> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(expand_home_path(trimmed))
}

pub fn expand_home_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Some(str_path) = path.to_str() else {
        return path.to_path_buf();
    };
    let home = std::env::var("HOME").ok().map(PathBuf::from);
    match (str_path, home) {
        ("~", Some(home)) => home,
        (other, Some(home)) if other.starts_with("~/") => home.join(&other[2..]),
        _ => path.to_path_buf(),
    }
}

/// `QUICKFILE_CREDENTIALS_PATH` wins; otherwise the per-user default.
pub fn resolve_credentials_path() -> PathBuf {
    normalize_env_path(std::env::var(env::CREDENTIALS_PATH).ok())
        .unwrap_or_else(|| expand_home_path(credentials::DEFAULT_PATH))
}

use std::path::{Path, PathBuf};

/// Environment variables checked for the synthesis key, in order.
pub const API_KEY_VARS: [&str; 2] = ["ELEVEN_LABS_KEY", "ELEVENLABS_API_KEY"];

/// Pick the synthesis API key: an explicit value, then the configured one,
/// then the environment. Blank values are skipped.
pub fn resolve_api_key(
    explicit: Option<&str>,
    configured: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(std::iter::once(configured.to_string()))
        .chain(API_KEY_VARS.iter().filter_map(|var| env(var)))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// [`resolve_api_key`] against the process environment.
pub fn resolve_api_key_from_env(explicit: Option<&str>, configured: &str) -> Option<String> {
    resolve_api_key(explicit, configured, |var| std::env::var(var).ok())
}

/// Load a `.env` file from the working directory or one of its parents.
/// Variables that are already set are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
            None
        }
    }
}

/// Load a specific env file. Variables that are already set are left alone.
pub fn load_env_file(path: &Path) -> anyhow::Result<()> {
    dotenvy::from_path(path)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
}

use dirs::config_dir;
use std::path::PathBuf;

/// Location of the user config file, or None if no config directory can be resolved.
///
/// `AGENTDL_CONFIG` overrides the platform default
/// (`<config dir>/agentdl/config.toml`).
pub fn config_path() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("AGENTDL_CONFIG") {
        return Some(PathBuf::from(val));
    }
    config_dir().map(|d| d.join("agentdl").join("config.toml"))
}

/// Extract the filename from a URL, ignoring any query string or fragment.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or("");
    path.split('/').next_back().unwrap_or("")
}

/// Whether `name` is a single path component that is safe to join onto a
/// download directory.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

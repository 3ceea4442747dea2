//! Home directory resolution for the client.
//!
//! The home directory holds the session file and the log files. It is
//! resolved once at config load time and stored back as an absolute path.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeDirError {
    #[error("cannot determine the platform {kind} directory")]
    NoPlatformHome { kind: &'static str },

    #[error("cannot determine the current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Roaming app data on Windows, the user home elsewhere.
#[cfg(target_os = "windows")]
const PLATFORM_HOME_KIND: &str = "data";
#[cfg(not(target_os = "windows"))]
const PLATFORM_HOME_KIND: &str = "home";

#[cfg(target_os = "windows")]
fn platform_home() -> Option<PathBuf> {
    dirs::data_dir()
}

#[cfg(not(target_os = "windows"))]
fn platform_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Resolve the client home directory.
///
/// - `explicit`: user-provided path; `~` and `~/...` expand to the platform home,
///   relative paths are made absolute against the current directory.
/// - `None` resolves to `<platform home>/<default_subdir>`.
/// - `create`: create the directory (and parents) when missing.
pub fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    resolve_with_platform_home(explicit, default_subdir, create, platform_home())
}

fn resolve_with_platform_home(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
    home: Option<PathBuf>,
) -> Result<PathBuf, HomeDirError> {
    let require_home = || {
        home.clone().ok_or(HomeDirError::NoPlatformHome {
            kind: PLATFORM_HOME_KIND,
        })
    };

    let resolved = match explicit.as_deref().map(str::trim) {
        None | Some("") => require_home()?.join(default_subdir),
        Some("~") => require_home()?,
        Some(p) if p.starts_with("~/") || p.starts_with("~\\") => require_home()?.join(&p[2..]),
        Some(p) => absolutize(Path::new(p))?,
    };

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.clone(),
            source,
        })?;
    }

    Ok(resolved)
}

fn absolutize(p: &Path) -> Result<PathBuf, HomeDirError> {
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(HomeDirError::CurrentDir)?;
    Ok(cwd.join(p))
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the student_portal module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StudentPortalConfig {
    /// Session file; relative paths resolve against the client home directory.
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

impl Default for StudentPortalConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

impl StudentPortalConfig {
    pub fn session_path(&self, home_dir: &Path) -> PathBuf {
        let p = Path::new(self.session_file.trim());
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            home_dir.join(p)
        }
    }
}

fn default_session_file() -> String {
    "session.json".to_string()
}

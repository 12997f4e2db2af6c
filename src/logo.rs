//! Logo override block for the proxy configuration.

use crate::error::PatchError;
use std::path::{Path, PathBuf};

/// Conventional file name of the dashboard's main logo.
pub const DEFAULT_LOGO_FILE: &str = "logo_title_white.svg";

/// A logo file on disk plus the URL route it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoAsset {
    pub path: PathBuf,
    pub route: String,
}

impl LogoAsset {
    /// Resolve `file` against `assets_dir` (absolute `file` wins) and default
    /// the route to `/assets/<file name>`.
    pub fn resolve(assets_dir: &Path, file: &Path, route: Option<&str>) -> Self {
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            assets_dir.join(file)
        };
        let route = match route {
            Some(r) => r.to_string(),
            None => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_LOGO_FILE.to_string());
                format!("/assets/{name}")
            }
        };
        Self { path, route }
    }

    /// The asset must exist as a regular file before anything is inserted.
    pub fn ensure_exists(&self) -> Result<(), PatchError> {
        if self.path.is_file() {
            tracing::debug!(path = %self.path.display(), "found logo asset");
            Ok(())
        } else {
            Err(PatchError::AssetMissing {
                path: self.path.clone(),
            })
        }
    }

    /// nginx `location` block that serves this asset in place of the bundled one.
    pub fn location_block(&self) -> String {
        format!(
            "    location = {route} {{\n        alias {alias};\n        add_header Cache-Control \"no-store\";\n    }}\n",
            route = self.route,
            alias = self.path.display(),
        )
    }
}

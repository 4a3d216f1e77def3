// Extension packaging
//
// Producing a .vsix archive from an extension source directory is delegated
// to the external `vsce` tool. This module only prepares the invocation and
// checks its outcome.

mod vsce;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options forwarded to the packager
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Extension source directory (defaults to the current directory)
    pub cwd: Option<PathBuf>,
    /// Prepended to relative links in README.md
    pub base_content_url: Option<String>,
    /// Prepended to relative image links in README.md
    pub base_images_url: Option<String>,
    /// Use yarn instead of npm to collect dependencies
    pub use_yarn: bool,
}

/// Package the extension described by `options` into `output`
pub async fn create_vsix(options: &PackageOptions, output: &Path) -> Result<()> {
    if let Some(cwd) = &options.cwd {
        if !cwd.exists() {
            bail!("Path '{}' does not exist", cwd.display());
        }
        if !cwd.is_dir() {
            bail!("Path '{}' is not a directory", cwd.display());
        }
    }

    info!(
        "Packaging extension from '{}'",
        options
            .cwd
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .display()
    );

    vsce::package(options, output).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let options = PackageOptions {
            cwd: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = create_vsix(&options, Path::new("out.vsix")).await.unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}

// vsce implementation

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use super::PackageOptions;

const VSCE: &str = "vsce";

/// Build the `vsce package` invocation without running it
pub(super) fn package_command(options: &PackageOptions, output: &Path) -> Command {
    let mut cmd = Command::new(VSCE);
    cmd.arg("package").arg("--out").arg(output);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    if let Some(url) = &options.base_content_url {
        cmd.arg("--baseContentUrl").arg(url);
    }
    if let Some(url) = &options.base_images_url {
        cmd.arg("--baseImagesUrl").arg(url);
    }
    if options.use_yarn {
        cmd.arg("--yarn");
    }

    cmd
}

/// Package an extension using the vsce CLI
pub(super) async fn package(options: &PackageOptions, output: &Path) -> Result<()> {
    if Command::new(VSCE).arg("--version").output().await.is_err() {
        bail!(
            "vsce CLI not found. Please install it with 'npm install -g vsce' \
             or pass a prebuilt package file instead"
        );
    }

    let mut cmd = package_command(options, output);
    debug!("Executing command: {:?}", cmd);

    let status = cmd.status().await.context("Failed to execute vsce package")?;
    if !status.success() {
        bail!("vsce package failed with status: {}", status);
    }

    // The output path may be a pre-created temp file, so check it has content
    let produced = tokio::fs::metadata(output)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    if !produced {
        bail!("vsce did not produce a package at '{}'", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::PathBuf;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.as_std().get_args().collect()
    }

    #[test]
    fn test_minimal_command() {
        let cmd = package_command(&PackageOptions::default(), Path::new("/tmp/out.vsix"));
        assert_eq!(cmd.as_std().get_program(), "vsce");
        assert_eq!(args(&cmd), ["package", "--out", "/tmp/out.vsix"]);
        assert_eq!(cmd.as_std().get_current_dir(), None);
    }

    #[test]
    fn test_forwarded_options() {
        let options = PackageOptions {
            cwd: Some(PathBuf::from("/src/ext")),
            base_content_url: Some("https://example.com/content".to_string()),
            base_images_url: Some("https://example.com/images".to_string()),
            use_yarn: true,
        };
        let cmd = package_command(&options, Path::new("out.vsix"));
        assert_eq!(
            args(&cmd),
            [
                "package",
                "--out",
                "out.vsix",
                "--baseContentUrl",
                "https://example.com/content",
                "--baseImagesUrl",
                "https://example.com/images",
                "--yarn",
            ]
        );
        assert_eq!(cmd.as_std().get_current_dir(), Some(Path::new("/src/ext")));
    }
}

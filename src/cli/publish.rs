use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::Extension;
use crate::cli::config::Config;
use crate::package::{self, PackageOptions};
use crate::registry::Registry;

/// Options of `ovsx publish`
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Base URL of the registry API
    pub registry_url: Option<String>,
    /// Personal access token
    pub pat: Option<String>,
    /// Prebuilt package to publish. Cannot be used together with `package_path`.
    pub package_file: Option<PathBuf>,
    /// Extension directory to package and publish. Cannot be used together
    /// with `package_file`.
    pub package_path: Option<PathBuf>,
    /// Base URL for links in Markdown files. Only valid with `package_path`.
    pub base_content_url: Option<String>,
    /// Base URL for images in Markdown files. Only valid with `package_path`.
    pub base_images_url: Option<String>,
    /// Use yarn instead of npm. Only valid with `package_path`.
    pub yarn: bool,
}

impl PublishOptions {
    /// Reject conflicting inputs and warn about options that will be ignored.
    ///
    /// Runs before any packaging or network activity.
    pub fn validate(&self) -> Result<()> {
        if self.package_file.is_some() && self.package_path.is_some() {
            bail!("Please specify either a package file or a package path, but not both.");
        }

        if self.package_file.is_some() {
            if self.base_content_url.is_some() {
                warn!("Ignoring option 'baseContentUrl' for prepackaged extension.");
            }
            if self.base_images_url.is_some() {
                warn!("Ignoring option 'baseImagesUrl' for prepackaged extension.");
            }
            if self.yarn {
                warn!("Ignoring option 'yarn' for prepackaged extension.");
            }
        }

        Ok(())
    }

    fn package_options(&self) -> PackageOptions {
        PackageOptions {
            cwd: self.package_path.clone(),
            base_content_url: self.base_content_url.clone(),
            base_images_url: self.base_images_url.clone(),
            use_yarn: self.yarn,
        }
    }
}

/// Publish an extension, packaging it first unless a package file was given
pub async fn publish(options: PublishOptions, config: &Config) -> Result<Extension> {
    options.validate()?;

    let registry_url = config.resolve_registry_url(options.registry_url.as_deref());
    let pat = config.resolve_pat(options.pat.as_deref());
    let registry = Registry::new(Some(&registry_url))?;

    // The temporary package is removed when `_temp_package` goes out of scope
    let (package_file, _temp_package) = match &options.package_file {
        Some(file) => (file.clone(), None),
        None => {
            let temp = tempfile::Builder::new()
                .prefix("ovsx-")
                .suffix(".vsix")
                .tempfile()
                .context("Failed to create temporary package file")?
                .into_temp_path();
            package::create_vsix(&options.package_options(), &temp).await?;
            (temp.to_path_buf(), Some(temp))
        }
    };

    if pat.is_none() {
        warn!("No personal access token given, the registry may reject the upload");
    }

    info!(
        "Publishing '{}' to {}",
        package_file.display(),
        registry.url()
    );

    let extension = registry
        .publish(&package_file, pat.as_deref())
        .await
        .with_context(|| format!("Failed to publish '{}'", package_file.display()))?;

    println!(
        "✓ Published {} v{}",
        extension.id(),
        extension.version
    );

    Ok(extension)
}

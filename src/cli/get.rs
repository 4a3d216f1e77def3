use anyhow::{anyhow, bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::api::{Extension, ExtensionReference};
use crate::cli::config::Config;
use crate::registry::Registry;

lazy_static! {
    static ref EXTENSION_ID: Regex = Regex::new(r"^(\w+)\.(\w+)(?:@(.+))?$").unwrap();
}

/// Options of `ovsx get`
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Identifier in the form `publisher.extension@version`, version optional
    pub extension_id: String,
    /// Base URL of the registry API
    pub registry_url: Option<String>,
    /// Save the output in the specified file
    pub output: Option<PathBuf>,
    /// Print the extension's metadata instead of downloading it
    pub metadata: bool,
}

impl GetOptions {
    /// Check the identifier and the requested mode before any I/O
    pub fn validate(&self) -> Result<ExtensionReference> {
        let reference = parse_extension_id(&self.extension_id)?;
        if !self.metadata {
            bail!(
                "Downloading extension packages is not supported yet. \
                 Use --metadata to fetch the metadata of '{}'.",
                reference
            );
        }
        Ok(reference)
    }
}

/// Parse `publisher.extension[@version]`
pub fn parse_extension_id(id: &str) -> Result<ExtensionReference> {
    let captures = EXTENSION_ID.captures(id.trim()).ok_or_else(|| {
        anyhow!(
            "The extension identifier must have the form `publisher.extension@version` \
             (the version is optional), got '{}'.",
            id
        )
    })?;

    Ok(ExtensionReference::new(
        &captures[1],
        &captures[2],
        captures.get(3).map(|m| m.as_str()),
    ))
}

/// Serialize with four-space indentation
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize extension metadata")?;
    String::from_utf8(buf).context("Serialized metadata is not valid UTF-8")
}

/// Fetch an extension's metadata and print it or write it to a file
pub async fn get_extension(options: &GetOptions, config: &Config) -> Result<Extension> {
    let reference = options.validate()?;

    let registry_url = config.resolve_registry_url(options.registry_url.as_deref());
    let registry = Registry::new(Some(&registry_url))?;

    info!("Fetching metadata of '{}' from {}", reference, registry.url());
    let extension = registry
        .get_metadata(
            &reference.publisher,
            &reference.extension,
            reference.version.as_deref(),
        )
        .await
        .with_context(|| format!("Failed to get metadata of '{}'", reference))?;

    let json = to_pretty_json(&extension)?;
    match &options.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Saved metadata of {} to {}", extension.id(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(extension)
}

//! Command line interface
//!
//! Argument definitions and dispatch. Each subcommand is implemented in its
//! own module; errors bubble up to `main`, which is the only place that
//! prints them and sets the exit status.

pub mod config;
pub mod get;
pub mod marketplace;
pub mod publish;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::ExtensionCategory;
use crate::marketplace::{ExtensionFilter, ExtensionRegistryApi, ExtensionRegistryService};
use config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Registry URL flag shared by all commands talking to a registry
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Use the registry API at this base URL
    #[arg(short = 'r', long = "registryUrl", visible_alias = "registry-url")]
    pub registry_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish an extension
    Publish {
        /// Prebuilt package (.vsix) to publish
        package_file: Option<PathBuf>,
        #[command(flatten)]
        registry: RegistryArgs,
        /// Personal access token
        #[arg(short = 'p', long)]
        pat: Option<String>,
        /// Package and publish the extension at the specified path
        #[arg(long = "packagePath", visible_alias = "package-path")]
        package_path: Option<PathBuf>,
        /// Prepend all relative links in README.md with this URL
        #[arg(long = "baseContentUrl", visible_alias = "base-content-url")]
        base_content_url: Option<String>,
        /// Prepend all relative image links in README.md with this URL
        #[arg(long = "baseImagesUrl", visible_alias = "base-images-url")]
        base_images_url: Option<String>,
        /// Use yarn instead of npm while packing extension files
        #[arg(long)]
        yarn: bool,
    },
    /// Download an extension or its metadata
    Get {
        /// Extension identifier in the form `publisher.extension@version` (version optional)
        extension_id: String,
        #[command(flatten)]
        registry: RegistryArgs,
        /// Save the output in the specified file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the extension's metadata instead of downloading it
        #[arg(long)]
        metadata: bool,
    },
    /// Search extensions in the registry
    #[command(visible_alias = "ls")]
    Search {
        /// Full text query
        #[arg(long, short)]
        query: Option<String>,
        #[command(flatten)]
        registry: RegistryArgs,
        /// Only list extensions of this category
        #[arg(long, short)]
        category: Option<ExtensionCategory>,
        /// Number of results to skip
        #[arg(long)]
        offset: Option<u64>,
        /// Maximum number of results
        #[arg(long)]
        size: Option<u64>,
    },
    /// Show details of an extension
    Show {
        /// Extension identifier in the form `publisher.extension@version` (version optional)
        extension_id: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Print the README of an extension
    Readme {
        /// Extension identifier in the form `publisher.extension@version` (version optional)
        extension_id: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// List the reviews of an extension
    Reviews {
        /// Extension identifier in the form `publisher.extension` (version optional)
        extension_id: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Review an extension
    Review {
        /// Extension identifier in the form `publisher.extension`
        extension_id: String,
        /// Rating from 1 to 5 stars
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        /// Review title
        #[arg(long)]
        title: String,
        /// Review text
        #[arg(long, default_value = "")]
        comment: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Show the user owning the registry session
    Whoami {
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// List the marketplace categories
    Categories,
    /// Store a personal access token (and optionally a registry URL) in the config file
    Login {
        /// Personal access token
        #[arg(short = 'p', long)]
        pat: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
}

/// Build the marketplace service for one invocation.
///
/// The configured personal access token authenticates user requests such as
/// `whoami` and `review`.
fn marketplace_service(config: &Config, registry: &RegistryArgs) -> Result<Arc<ExtensionRegistryService>> {
    let url = config.resolve_registry_url(registry.registry_url.as_deref());
    let api = ExtensionRegistryApi::new()?.with_token(config.resolve_pat(None));
    Ok(Arc::new(ExtensionRegistryService::with_api(&url, api)?))
}

/// Store a personal access token, and optionally a registry URL, in the config file
fn login(pat: String, registry_url: Option<String>, config_path: &Path) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    config.pat = Some(pat);
    if let Some(url) = registry_url {
        config.registry_url = Some(url);
    }
    config.save_to(config_path)?;
    println!("✓ Saved credentials to {}", config_path.display());
    Ok(())
}

/// Execute a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    execute(cli, &Config::config_path()?).await
}

/// Execute a command against the config file at `config_path`.
///
/// The file is only read by commands that need it, after their own arguments
/// have been checked.
async fn execute(cli: Cli, config_path: &Path) -> Result<()> {
    let load_config = || Config::load_from(config_path);

    match cli.command {
        Commands::Publish {
            package_file,
            registry,
            pat,
            package_path,
            base_content_url,
            base_images_url,
            yarn,
        } => {
            let options = publish::PublishOptions {
                registry_url: registry.registry_url,
                pat,
                package_file,
                package_path,
                base_content_url,
                base_images_url,
                yarn,
            };
            publish::publish(options, &load_config()?).await?;
        }
        Commands::Get {
            extension_id,
            registry,
            output,
            metadata,
        } => {
            let options = get::GetOptions {
                extension_id,
                registry_url: registry.registry_url,
                output,
                metadata,
            };
            options.validate()?;
            get::get_extension(&options, &load_config()?).await?;
        }
        Commands::Search {
            query,
            registry,
            category,
            offset,
            size,
        } => {
            let service = marketplace_service(&load_config()?, &registry)?;
            let filter = ExtensionFilter {
                full_text: query,
                category,
                offset,
                size,
            };
            marketplace::search(&service, &filter).await?;
        }
        Commands::Show {
            extension_id,
            registry,
        } => {
            let reference = get::parse_extension_id(&extension_id)?;
            let service = marketplace_service(&load_config()?, &registry)?;
            marketplace::show(&service, &reference).await?;
        }
        Commands::Readme {
            extension_id,
            registry,
        } => {
            let reference = get::parse_extension_id(&extension_id)?;
            let service = marketplace_service(&load_config()?, &registry)?;
            marketplace::readme(&service, &reference).await?;
        }
        Commands::Reviews {
            extension_id,
            registry,
        } => {
            let reference = get::parse_extension_id(&extension_id)?;
            let service = marketplace_service(&load_config()?, &registry)?;
            marketplace::reviews(&service, &reference).await?;
        }
        Commands::Review {
            extension_id,
            rating,
            title,
            comment,
            registry,
        } => {
            let reference = get::parse_extension_id(&extension_id)?;
            let service = marketplace_service(&load_config()?, &registry)?;
            marketplace::post_review(&service, &reference, rating, &title, &comment).await?;
        }
        Commands::Whoami { registry } => {
            let service = marketplace_service(&load_config()?, &registry)?;
            marketplace::whoami(&service).await?;
        }
        Commands::Categories => {
            // Categories are static, no registry settings involved
            let service = marketplace_service(&Config::default(), &RegistryArgs::default())?;
            marketplace::categories(&service);
        }
        Commands::Login { pat, registry } => {
            login(pat, registry.registry_url, config_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserState;
    use crate::testing::serve;
    use axum::{extract::Query, routing::get, Json, Router};
    use clap::error::ErrorKind;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ovsx").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_publish_arguments() {
        let cli = Cli::try_parse_from([
            "ovsx",
            "publish",
            "ext.vsix",
            "-r",
            "http://registry",
            "-p",
            "token",
            "--yarn",
        ])
        .unwrap();

        match cli.command {
            Commands::Publish {
                package_file,
                registry,
                pat,
                package_path,
                yarn,
                ..
            } => {
                assert_eq!(package_file, Some(PathBuf::from("ext.vsix")));
                assert_eq!(registry.registry_url.as_deref(), Some("http://registry"));
                assert_eq!(pat.as_deref(), Some("token"));
                assert_eq!(package_path, None);
                assert!(yarn);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_camel_case_flags() {
        let cli = Cli::try_parse_from([
            "ovsx",
            "publish",
            "--packagePath",
            "./ext",
            "--baseContentUrl",
            "https://example.com",
            "--registryUrl",
            "http://registry",
        ])
        .unwrap();

        match cli.command {
            Commands::Publish {
                package_path,
                base_content_url,
                registry,
                ..
            } => {
                assert_eq!(package_path, Some(PathBuf::from("./ext")));
                assert_eq!(base_content_url.as_deref(), Some("https://example.com"));
                assert_eq!(registry.registry_url.as_deref(), Some("http://registry"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_suggests_similar() {
        let err = Cli::try_parse_from(["ovsx", "publsh"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert!(err.to_string().contains("publish"));
    }

    #[test]
    fn test_search_category_is_validated() {
        let cli = Cli::try_parse_from(["ovsx", "search", "--query", "python", "-c", "linters"]).unwrap();
        match cli.command {
            Commands::Search {
                query, category, ..
            } => {
                assert_eq!(query.as_deref(), Some("python"));
                assert_eq!(category, Some(ExtensionCategory::Linters));
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["ovsx", "search", "--category", "Widgets"]).is_err());
    }

    #[test]
    fn test_review_rating_range() {
        assert!(Cli::try_parse_from([
            "ovsx", "review", "acme.ext", "--rating", "6", "--title", "t"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "ovsx", "review", "acme.ext", "--rating", "5", "--title", "t"
        ])
        .is_ok());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn test_login_authenticates_user_requests() {
        async fn user(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
            match query.get("token").map(String::as_str) {
                Some("my-token") => Json(json!({"name": "alice"})),
                _ => Json(json!({"error": "Not logged in."})),
            }
        }

        let base = serve(Router::new().route("/-/user", get(user))).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ovsx").join("config.json");

        execute(parse(&["login", "-p", "my-token", "-r", base.as_str()]), &path)
            .await
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pat.as_deref(), Some("my-token"));
        assert_eq!(config.registry_url.as_deref(), Some(base.as_str()));

        let service = marketplace_service(&config, &RegistryArgs::default()).unwrap();
        let state = service.get_user().await.unwrap();
        assert!(matches!(state, UserState::LoggedIn(ref user) if user.name == "alice"));

        execute(parse(&["whoami"]), &path).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_config_only_affects_commands_using_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        execute(parse(&["categories"]), &path).await.unwrap();

        let err = execute(parse(&["get", "not-an-id", "--metadata"]), &path)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("publisher.extension@version"));

        let err = execute(parse(&["show", "not-an-id"]), &path).await.unwrap_err();
        assert!(err.to_string().contains("publisher.extension@version"));

        let err = execute(parse(&["get", "acme.ext", "--metadata"]), &path)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

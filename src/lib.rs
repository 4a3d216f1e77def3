//! Client for Open VSX style extension registries.
//!
//! The library part talks to the registry API ([`registry::Registry`]) and to
//! the browsing endpoints of the marketplace front-end
//! ([`marketplace::ExtensionRegistryService`]). The `cli` feature adds the
//! `ovsx` command line on top.

pub mod api;
pub mod error;
pub mod marketplace;
pub mod registry;
pub mod urls;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod package;

#[cfg(test)]
mod testing;

pub use error::RegistryError;

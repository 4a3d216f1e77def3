//! Marketplace data layer
//!
//! Client side of the registry's browsing API: search, extension details,
//! README, reviews and the current user. The terminal front end in
//! `cli::marketplace` renders what this module returns.

pub mod api;
pub mod cancel;
pub mod service;

pub use api::ExtensionRegistryApi;
pub use cancel::{RequestTicket, SupersedingRequests};
pub use service::{
    readme_url, reviews_url, ExtensionFilter, ExtensionListing, ExtensionRegistryService,
    ListingSnapshot,
};

//! Registry request/response types
//!
//! These types mirror the JSON documents served by the registry and are shared
//! by the CLI registry client and the marketplace service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifies an extension (and optionally one version) without its metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionReference {
    pub publisher: String,
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ExtensionReference {
    pub fn new(publisher: &str, extension: &str, version: Option<&str>) -> Self {
        Self {
            publisher: publisher.to_string(),
            extension: extension.to_string(),
            version: version.map(str::to_string),
        }
    }
}

impl fmt::Display for ExtensionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.extension)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

/// Badge shown on an extension page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub url: String,
    pub href: String,
    pub description: String,
}

/// Metadata of one extension version as served by the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub name: String,
    pub publisher: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub publisher_url: String,
    #[serde(default)]
    pub reviews_url: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_url: Option<String>,

    #[serde(default)]
    pub all_versions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qna: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<Badge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<ExtensionReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_extensions: Option<Vec<ExtensionReference>>,

    /// Fields this client does not know about, kept so metadata can be
    /// written back out unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Extension {
    /// `publisher.name`, the identifier users type on the command line
    pub fn id(&self) -> String {
        format!("{}.{}", self.publisher, self.name)
    }

    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Star rating of a review, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StarRating(u8);

impl StarRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for StarRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<StarRating> for u8 {
    fn from(rating: StarRating) -> Self {
        rating.0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = self.0 as usize;
        write!(
            f,
            "{}{}",
            "★".repeat(filled),
            "☆".repeat(Self::MAX as usize - filled)
        )
    }
}

/// Registry user profile as served by `/-/user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "loginName", alias = "userName")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Whether the registry session belongs to a logged in user
#[derive(Debug, Clone, PartialEq)]
pub enum UserState {
    LoggedIn(User),
    Anonymous,
}

impl UserState {
    /// Decide the session state from the body of `/-/user`.
    ///
    /// Anything that is not a user profile means nobody is logged in.
    pub fn from_json(value: Value) -> Self {
        match serde_json::from_value::<User>(value) {
            Ok(user) => UserState::LoggedIn(user),
            Err(_) => UserState::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            UserState::LoggedIn(user) => Some(user),
            UserState::Anonymous => None,
        }
    }
}

/// Author of a review.
///
/// The registry stores and sends plain user names; a full profile object is
/// accepted when reading as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewAuthor {
    Name(String),
    Profile(User),
}

impl ReviewAuthor {
    pub fn name(&self) -> &str {
        match self {
            ReviewAuthor::Name(name) => name,
            ReviewAuthor::Profile(user) => &user.name,
        }
    }
}

impl From<&User> for ReviewAuthor {
    fn from(user: &User) -> Self {
        ReviewAuthor::Name(user.name.clone())
    }
}

/// A single user review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionReview {
    pub rating: StarRating,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    pub user: ReviewAuthor,
    #[serde(default, alias = "timestamp")]
    pub date: String,
}

/// Reviews of an extension plus the endpoint for posting new ones
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionReviewList {
    pub post_url: String,
    pub reviews: Vec<ExtensionReview>,
}

/// Response of the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub offset: u64,
    pub extensions: Vec<ExtensionReference>,
}

/// Marketplace categories, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionCategory {
    ProgrammingLanguages,
    Snippets,
    Linters,
    Themes,
    Debuggers,
    Formatters,
    Keymaps,
    ScmProviders,
    Other,
    ExtensionPacks,
    LanguagePacks,
}

impl ExtensionCategory {
    pub const ALL: [ExtensionCategory; 11] = [
        ExtensionCategory::ProgrammingLanguages,
        ExtensionCategory::Snippets,
        ExtensionCategory::Linters,
        ExtensionCategory::Themes,
        ExtensionCategory::Debuggers,
        ExtensionCategory::Formatters,
        ExtensionCategory::Keymaps,
        ExtensionCategory::ScmProviders,
        ExtensionCategory::Other,
        ExtensionCategory::ExtensionPacks,
        ExtensionCategory::LanguagePacks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExtensionCategory::ProgrammingLanguages => "Programming Languages",
            ExtensionCategory::Snippets => "Snippets",
            ExtensionCategory::Linters => "Linters",
            ExtensionCategory::Themes => "Themes",
            ExtensionCategory::Debuggers => "Debuggers",
            ExtensionCategory::Formatters => "Formatters",
            ExtensionCategory::Keymaps => "Keymaps",
            ExtensionCategory::ScmProviders => "SCM Providers",
            ExtensionCategory::Other => "Other",
            ExtensionCategory::ExtensionPacks => "Extension Packs",
            ExtensionCategory::LanguagePacks => "Language Packs",
        }
    }
}

impl fmt::Display for ExtensionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExtensionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtensionCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let labels: Vec<&str> = ExtensionCategory::ALL.iter().map(|c| c.label()).collect();
                format!(
                    "Unknown category '{}'. Valid categories: {}",
                    s,
                    labels.join(", ")
                )
            })
    }
}

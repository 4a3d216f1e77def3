//! Terminal views of the marketplace: search results, extension details,
//! README, reviews and the current user.

use anyhow::{bail, Context, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Table};
use tracing::info;

use crate::api::{
    Extension, ExtensionReference, ExtensionReview, ReviewAuthor, StarRating, UserState,
};
use crate::marketplace::{readme_url, reviews_url, ExtensionFilter, ExtensionRegistryService};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

/// Search the registry and list matching extensions
pub async fn search(service: &ExtensionRegistryService, filter: &ExtensionFilter) -> Result<()> {
    let extensions = service
        .get_extensions(Some(filter))
        .await
        .context("Failed to search extensions")?;

    if extensions.is_empty() {
        println!("No extensions found");
        return Ok(());
    }

    let mut table = table(&["EXTENSION", "VERSION"]);
    for ext in &extensions {
        table.add_row(vec![
            Cell::new(format!("{}.{}", ext.publisher, ext.extension)),
            Cell::new(ext.version.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{}", table);
    Ok(())
}

async fn fetch_extension(service: &ExtensionRegistryService, reference: &ExtensionReference) -> Result<Extension> {
    service
        .get_extension_detail(&service.extension_url(reference))
        .await
        .with_context(|| format!("Failed to fetch extension '{}'", reference))
}

/// Show the details of one extension
pub async fn show(service: &ExtensionRegistryService, reference: &ExtensionReference) -> Result<()> {
    let ext = fetch_extension(service, reference).await?;

    println!("{} ({})", ext.title(), ext.id());
    println!("  Version:     {}", ext.version);
    if let Some(description) = &ext.description {
        println!("  Description: {}", description);
    }
    if let Some(rating) = ext.average_rating {
        match ext.review_count {
            Some(count) => println!("  Rating:      {:.1} / 5 ({} reviews)", rating, count),
            None => println!("  Rating:      {:.1} / 5", rating),
        }
    }
    if let Some(license) = &ext.license {
        println!("  License:     {}", license);
    }
    if let Some(categories) = ext.categories.as_ref().filter(|c| !c.is_empty()) {
        println!("  Categories:  {}", categories.join(", "));
    }
    if let Some(tags) = ext.tags.as_ref().filter(|t| !t.is_empty()) {
        println!("  Tags:        {}", tags.join(", "));
    }
    if let Some(homepage) = &ext.homepage {
        println!("  Homepage:    {}", homepage);
    }
    if let Some(repository) = &ext.repository {
        println!("  Repository:  {}", repository);
    }
    if !ext.download_url.is_empty() {
        println!("  Download:    {}", ext.download_url);
    }
    if let Some(dependencies) = ext.dependencies.as_ref().filter(|d| !d.is_empty()) {
        let ids: Vec<String> = dependencies.iter().map(ToString::to_string).collect();
        println!("  Depends on:  {}", ids.join(", "));
    }
    if !ext.all_versions.is_empty() {
        let versions: Vec<&str> = ext.all_versions.keys().map(String::as_str).collect();
        println!("  Versions:    {}", versions.join(", "));
    }

    Ok(())
}

/// Print an extension's README as Markdown
pub async fn readme(service: &ExtensionRegistryService, reference: &ExtensionReference) -> Result<()> {
    let ext = fetch_extension(service, reference).await?;
    let text = service
        .get_extension_readme(&readme_url(&ext))
        .await
        .with_context(|| format!("Failed to fetch README of '{}'", ext.id()))?;
    println!("{}", text);
    Ok(())
}

/// List the reviews of an extension
pub async fn reviews(service: &ExtensionRegistryService, reference: &ExtensionReference) -> Result<()> {
    let ext = fetch_extension(service, reference).await?;
    let list = service
        .get_extension_reviews(&reviews_url(&ext))
        .await
        .with_context(|| format!("Failed to fetch reviews of '{}'", ext.id()))?;

    if list.reviews.is_empty() {
        println!("No reviews for {} yet", ext.id());
        return Ok(());
    }

    let mut table = table(&["RATING", "TITLE", "COMMENT", "USER", "DATE"]);
    for review in &list.reviews {
        table.add_row(vec![
            Cell::new(review.rating.to_string()),
            Cell::new(&review.title),
            Cell::new(&review.comment),
            Cell::new(review.user.name()),
            Cell::new(&review.date),
        ]);
    }

    println!("{}", table);
    Ok(())
}

/// Post a review as the user owning the registry session
pub async fn post_review(
    service: &ExtensionRegistryService,
    reference: &ExtensionReference,
    rating: u8,
    title: &str,
    comment: &str,
) -> Result<()> {
    let rating = StarRating::try_from(rating).map_err(anyhow::Error::msg)?;

    let user = match service.get_user().await? {
        UserState::LoggedIn(user) => user,
        UserState::Anonymous => bail!("You must be logged in to the registry to post a review."),
    };

    let ext = fetch_extension(service, reference).await?;
    let list = service
        .get_extension_reviews(&reviews_url(&ext))
        .await
        .with_context(|| format!("Failed to fetch reviews of '{}'", ext.id()))?;

    let review = ExtensionReview {
        rating,
        title: title.to_string(),
        comment: comment.to_string(),
        user: ReviewAuthor::from(&user),
        date: chrono::Utc::now().to_rfc3339(),
    };

    info!("Posting review of '{}'", ext.id());
    service
        .post_review(&review, &list.post_url)
        .await
        .context("Failed to post review")?;

    println!("✓ Posted {} review of {}", rating, ext.id());
    Ok(())
}

/// Show who owns the registry session
pub async fn whoami(service: &ExtensionRegistryService) -> Result<()> {
    match service.get_user().await? {
        UserState::LoggedIn(user) => {
            match &user.full_name {
                Some(full_name) => println!("Logged in as {} ({})", user.name, full_name),
                None => println!("Logged in as {}", user.name),
            }
            if let Some(provider) = &user.provider {
                println!("  Provider: {}", provider);
            }
        }
        UserState::Anonymous => println!("Not logged in"),
    }
    Ok(())
}

/// List the marketplace categories
pub fn categories(service: &ExtensionRegistryService) {
    for category in service.get_categories() {
        println!("{}", category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve;
    use axum::{
        extract::State,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Posted = Arc<Mutex<Vec<Value>>>;

    #[derive(Clone)]
    struct AppState {
        base: String,
        logged_in: bool,
        posted: Posted,
    }

    async fn user(State(state): State<AppState>) -> Json<Value> {
        if state.logged_in {
            Json(json!({"name": "alice", "avatarUrl": "https://avatars.example.com/alice"}))
        } else {
            Json(json!({"error": "Not logged in"}))
        }
    }

    async fn extension(State(state): State<AppState>) -> Json<Value> {
        Json(json!({
            "publisher": "acme",
            "name": "ext",
            "version": "1.0.0",
            "url": format!("{}/api/acme/ext", state.base),
        }))
    }

    async fn review_list(State(state): State<AppState>) -> Json<Value> {
        Json(json!({
            "postUrl": format!("{}/api/acme/ext/review", state.base),
            "reviews": [
                {"rating": 3, "title": "Fine", "comment": "", "user": "bob", "timestamp": "2019-10-01T12:00:00"}
            ]
        }))
    }

    async fn add_review(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
        state.posted.lock().unwrap().push(body);
        Json(json!({"success": "Added review"}))
    }

    async fn start(logged_in: bool) -> (ExtensionRegistryService, Posted) {
        // Responses embed absolute URLs, so the address must be known up front
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let posted: Posted = Arc::default();

        let app = Router::new()
            .route("/-/user", get(user))
            .route("/api/acme/ext", get(extension))
            .route("/api/acme/ext/reviews", get(review_list))
            .route("/api/acme/ext/review", post(add_review))
            .with_state(AppState {
                base: base.clone(),
                logged_in,
                posted: posted.clone(),
            });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (ExtensionRegistryService::new(&base).unwrap(), posted)
    }

    #[tokio::test]
    async fn test_post_review_as_logged_in_user() {
        let (service, posted) = start(true).await;
        let reference = ExtensionReference::new("acme", "ext", None);

        post_review(&service, &reference, 5, "Great", "Works well")
            .await
            .unwrap();

        let posted = posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0]["rating"], json!(5));
        assert_eq!(posted[0]["title"], json!("Great"));
        assert_eq!(posted[0]["user"], json!("alice"));
    }

    #[tokio::test]
    async fn test_post_review_requires_login() {
        let (service, posted) = start(false).await;
        let reference = ExtensionReference::new("acme", "ext", None);

        let err = post_review(&service, &reference, 4, "Good", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("logged in"));
        assert!(posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_review_rejects_bad_rating() {
        let (service, posted) = start(true).await;
        let reference = ExtensionReference::new("acme", "ext", None);

        assert!(post_review(&service, &reference, 0, "Bad", "").await.is_err());
        assert!(posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_views_render_without_error() {
        let (service, _) = start(true).await;
        let reference = ExtensionReference::new("acme", "ext", None);

        show(&service, &reference).await.unwrap();
        reviews(&service, &reference).await.unwrap();
        whoami(&service).await.unwrap();
        categories(&service);
    }

    #[tokio::test]
    async fn test_search_reports_registry_errors() {
        let app = Router::new().route(
            "/api/-/search",
            get(|| async { Json(json!({"error": "Search is disabled"})) }),
        );
        let base = serve(app).await;
        let service = ExtensionRegistryService::new(&base).unwrap();

        let err = search(&service, &ExtensionFilter::default()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Search is disabled"));
    }
}

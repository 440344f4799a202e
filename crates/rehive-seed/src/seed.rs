use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::args::Args;
use crate::client::{DirectusClient, SeedError};

/// Columns Directus manages itself.
const SYSTEM_FIELDS: [&str; 3] = ["id", "user_created", "user_updated"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub async fn run(args: &Args) -> Result<SeedReport, SeedError> {
    info!(target: "seed", "Connecting to Directus at {}", args.directus_url);
    let client = DirectusClient::new(&args.directus_url)?;

    let posts = read_seed_posts(&args.seed_file).await?;
    if posts.is_empty() {
        info!(target: "seed", "No posts found in seed data. Nothing to do.");
        return Ok(SeedReport::default());
    }

    let password = args
        .admin_password
        .as_deref()
        .filter(|password| !password.is_empty())
        .ok_or(SeedError::MissingPassword)?;
    let session = client.login(&args.admin_email, password).await?;
    info!(target: "seed", "Authenticated as admin user.");

    let mut report = SeedReport::default();
    for entry in posts {
        let Some(slug) = seed_slug(&entry) else {
            info!(target: "seed", "Skipping post without slug.");
            report.skipped += 1;
            continue;
        };
        let payload = prepare_payload(entry);

        match session.find_post_id(&slug).await? {
            Some(id) if args.dry_run => {
                info!(target: "seed", "Would update post: {slug} (id {id})");
                report.updated += 1;
            }
            Some(id) => {
                session.update_post(&id, &payload).await?;
                info!(target: "seed", "Updated post: {slug}");
                report.updated += 1;
            }
            None if args.dry_run => {
                info!(target: "seed", "Would create post: {slug}");
                report.created += 1;
            }
            None => {
                session.create_post(&payload).await?;
                info!(target: "seed", "Created post: {slug}");
                report.created += 1;
            }
        }
    }

    info!(target: "seed", "Seed completed successfully.");
    Ok(report)
}

/// Reads the `posts` array of a seed file. Anything other than an array
/// under `posts` counts as no posts.
pub async fn read_seed_posts(path: &Path) -> Result<Vec<Value>, SeedError> {
    let display = path.display().to_string();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::ReadSeed {
            path: display.clone(),
            source,
        })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| SeedError::ParseSeed {
        path: display,
        source,
    })?;

    let posts = match document {
        Value::Object(mut map) => match map.remove("posts") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(posts)
}

pub fn seed_slug(entry: &Value) -> Option<String> {
    entry
        .get("slug")
        .and_then(Value::as_str)
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

pub fn prepare_payload(entry: Value) -> Map<String, Value> {
    let Value::Object(mut map) = entry else {
        return Map::new();
    };
    for field in SYSTEM_FIELDS {
        map.remove(field);
    }
    map
}

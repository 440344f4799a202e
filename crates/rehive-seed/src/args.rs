use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rehive-seed",
    version,
    about = "Upsert seed posts into Directus, matching existing records by slug"
)]
pub struct Args {
    /// Base URL of the Directus instance
    #[arg(
        long = "directus-url",
        env = "DIRECTUS_URL",
        default_value = "http://127.0.0.1:8055"
    )]
    pub directus_url: String,

    /// Admin account used to authenticate
    #[arg(
        long = "admin-email",
        env = "ADMIN_EMAIL",
        default_value = "admin@example.com"
    )]
    pub admin_email: String,

    /// Admin password (prefer ADMIN_PASSWORD over the flag)
    #[arg(long = "admin-password", env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// JSON file with a top-level `posts` array
    #[arg(
        long = "seed-file",
        env = "DIRECTUS_SEED_FILE",
        default_value = "/directus/seed-data.json"
    )]
    pub seed_file: PathBuf,

    /// Look up every post but skip the writes
    #[arg(long)]
    pub dry_run: bool,
}

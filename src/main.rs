use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use github_issue_blog::blog::BlogService;
use github_issue_blog::config::Config;
use github_issue_blog::github::GitHubClient;
use github_issue_blog::web;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting github-issue-blog");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        owner = %config.github_owner,
        repo = %config.github_repo,
        "Configuration loaded"
    );

    let client = GitHubClient::from_config(&config).context("Failed to create GitHub client")?;

    // Probe token scope up front; image uploads need contents write access.
    match client.verify_permissions().await {
        Ok(true) => info!("GitHub token has write access"),
        Ok(false) => warn!("GitHub token lacks write access - image uploads will fail"),
        Err(e) => warn!("Could not verify GitHub token permissions: {e}"),
    }

    if config.admin_password.is_none() {
        warn!("ADMIN_PASSWORD not set - the admin gate will reject all requests");
    }

    let blog = BlogService::new(client);

    web::serve(config, blog).await
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,github_issue_blog=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

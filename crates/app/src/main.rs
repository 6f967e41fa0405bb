//! Headless entry point: restores the session, then reports what the guard
//! decides for each path given on the command line.

use anyhow::Context;
use chrono::Utc;
use frontdesk_app::{AppConfig, AppContext, Navigation, StaticTokenProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    frontdesk_observability::init();

    let config = AppConfig::from_env().context("invalid FRONTDESK_* configuration")?;
    if config.access_token.is_none() {
        tracing::warn!("FRONTDESK_ACCESS_TOKEN not set; starting signed out");
    }

    let provider = StaticTokenProvider::new(config.access_token.clone());
    let app = AppContext::from_config(&config, provider).context("failed to open the local data store")?;
    app.start().await;

    let signed_in = app.session().is_authenticated();
    tracing::info!(signed_in, "session ready");

    let stats = app.store().dashboard_stats(Utc::now().date_naive());
    tracing::info!(
        active_employees = stats.active_employees,
        todays_visitors = stats.todays_visitors,
        checked_in = stats.checked_in,
        expected = stats.expected,
        "dashboard"
    );

    let links: Vec<&str> = app.navigation_links().iter().map(|l| l.title).collect();
    tracing::info!(links = ?links, "navigation");

    let paths: Vec<String> = std::env::args().skip(1).collect();
    let paths = if paths.is_empty() { vec!["/".to_string()] } else { paths };
    for path in paths {
        match app.navigate(&path) {
            Navigation::Render(route) => tracing::info!(%path, route = %route.path(), "render"),
            Navigation::Redirect(route) => tracing::info!(%path, to = %route.path(), "redirect"),
        }
    }

    Ok(())
}

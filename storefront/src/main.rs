// storefront/src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use storefront::config::AppConfig;
use storefront::services::{auth_service, gateway};
use storefront::state::AppState;
use storefront::store::PgStore;
use storefront::web::configure_app_routes;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
  if json {
    tracing_subscriber::fmt().json().with_env_filter(filter).init();
  } else {
    tracing_subscriber::fmt().with_env_filter(filter).init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  tracing::info!("Starting storefront server...");

  let config = AppConfig::from_env().context("loading configuration")?;

  let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(&config.database_url)
    .await
    .context("connecting to the database")?;
  tracing::info!(max_connections = config.database_max_connections, "Database pool ready.");

  if config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .context("applying migrations")?;
    tracing::info!("Migrations applied.");
  }

  let store = Arc::new(PgStore::new(pool.clone()));
  if let Some(bootstrap) = &config.admin_bootstrap {
    auth_service::ensure_admin(store.as_ref(), bootstrap)
      .await
      .context("creating the admin account")?;
  }

  let gateway = gateway::gateway_from_config(&config).context("building the payment gateway client")?;
  let server_address = config.server_address();
  let app_state = AppState::new(config, store, gateway);

  let sessions = app_state.sessions.clone();
  let sweeper = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
      ticker.tick().await;
      let purged = sessions.purge_expired();
      if purged > 0 {
        tracing::debug!(purged, "Expired sessions removed.");
      }
    }
  });

  tracing::info!(address = %server_address, "Binding HTTP server.");
  let server_result = HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await;

  sweeper.abort();
  pool.close().await;
  tracing::info!("Server stopped; database pool closed.");
  server_result.context("running the HTTP server")
}

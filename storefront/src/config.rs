// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com";
pub const MOCK_KEY_ID: &str = "rzp_test_mock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
  Mock,
  Razorpay,
}

impl FromStr for GatewayKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "mock" => Ok(GatewayKind::Mock),
      "razorpay" => Ok(GatewayKind::Razorpay),
      other => Err(AppError::Config(format!(
        "Invalid PAYMENT_GATEWAY '{}': expected 'mock' or 'razorpay'",
        other
      ))),
    }
  }
}

/// Account created at startup when it does not exist yet.
#[derive(Clone)]
pub struct AdminBootstrap {
  pub name: String,
  pub email: String,
  pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AdminBootstrap")
      .field("name", &self.name)
      .field("email", &self.email)
      .field("password", &"[REDACTED]")
      .finish()
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub payment_gateway: GatewayKind,
  pub razorpay_key_id: String,
  pub razorpay_key_secret: String,
  pub razorpay_api_base: String,
  pub default_currency: String,

  pub session_ttl: Duration,
  pub admin_bootstrap: Option<AdminBootstrap>,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("database_max_connections", &self.database_max_connections)
      .field("run_migrations", &self.run_migrations)
      .field("payment_gateway", &self.payment_gateway)
      .field("razorpay_key_id", &self.razorpay_key_id)
      .field("razorpay_api_base", &self.razorpay_api_base)
      .field("default_currency", &self.default_currency)
      .field("session_ttl", &self.session_ttl)
      .field("admin_bootstrap", &self.admin_bootstrap)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());
    let require = |var_name: &str| {
      get_env(var_name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var(&get_env, "SERVER_PORT", 8080u16)?;
    let database_url = require("DATABASE_URL")?;
    let database_max_connections = parse_var(&get_env, "DATABASE_MAX_CONNECTIONS", 10u32)?;
    let run_migrations = parse_var(&get_env, "RUN_MIGRATIONS", true)?;

    let payment_gateway = match get_env("PAYMENT_GATEWAY") {
      Some(raw) => raw.parse::<GatewayKind>()?,
      None => GatewayKind::Mock,
    };
    // Callback signatures are checked with this secret whichever gateway is in use.
    let razorpay_key_secret = require("RAZORPAY_KEY_SECRET")?;
    let razorpay_key_id = match payment_gateway {
      GatewayKind::Razorpay => require("RAZORPAY_KEY_ID")?,
      GatewayKind::Mock => get_env("RAZORPAY_KEY_ID").unwrap_or_else(|| MOCK_KEY_ID.to_string()),
    };
    let razorpay_api_base = get_env("RAZORPAY_API_BASE").unwrap_or_else(|| DEFAULT_RAZORPAY_API_BASE.to_string());
    let default_currency = get_env("DEFAULT_CURRENCY")
      .unwrap_or_else(|| "INR".to_string())
      .to_ascii_uppercase();

    let session_ttl = Duration::from_secs(parse_var(&get_env, "SESSION_TTL_SECS", 24 * 60 * 60u64)?);
    if session_ttl.is_zero() {
      return Err(AppError::Config("SESSION_TTL_SECS must be positive".to_string()));
    }

    let admin_bootstrap = match (get_env("ADMIN_EMAIL"), get_env("ADMIN_PASSWORD")) {
      (Some(email), Some(password)) => Some(AdminBootstrap {
        name: get_env("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
        email,
        password,
      }),
      (None, None) => None,
      _ => {
        return Err(AppError::Config(
          "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
        ))
      }
    };

    tracing::info!(gateway = ?payment_gateway, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      payment_gateway,
      razorpay_key_id,
      razorpay_key_secret,
      razorpay_api_base,
      default_currency,
      session_ttl,
      admin_bootstrap,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(get_env: &impl Fn(&str) -> Option<String>, var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match get_env(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
    None => Ok(default),
  }
}

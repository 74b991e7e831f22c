// storefront/src/web/extractors.rs

//! Session extractors. A handler taking `UserSession` or `AdminSession`
//! only runs for a live session of that kind; `Option<..>` makes it optional.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::debug;

use crate::errors::AppError;
use crate::services::sessions::{Principal, ADMIN_SESSION_COOKIE, USER_SESSION_COOKIE};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct UserSession {
  pub session_id: String,
  pub user_id: i64,
  pub username: String,
  pub email: String,
  pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminSession {
  pub session_id: String,
  pub admin_id: i64,
  pub name: String,
  pub email: String,
}

/// Looks up and refreshes the session named by `cookie_name`.
fn live_session(req: &HttpRequest, cookie_name: &str) -> Result<(String, Principal), AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let cookie = req
    .cookie(cookie_name)
    .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;
  let session_id = cookie.value().to_string();
  match state.sessions.touch(&session_id) {
    Some(principal) => Ok((session_id, principal)),
    None => {
      debug!(cookie = cookie_name, "Unknown or expired session.");
      Err(AppError::Auth("Session expired".to_string()))
    }
  }
}

impl FromRequest for UserSession {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(
      live_session(req, USER_SESSION_COOKIE).and_then(|(session_id, principal)| match principal {
        Principal::User {
          id,
          username,
          email,
          full_name,
        } => Ok(UserSession {
          session_id,
          user_id: id,
          username,
          email,
          full_name,
        }),
        Principal::Admin { .. } => Err(AppError::Auth("Not authenticated".to_string())),
      }),
    )
  }
}

impl FromRequest for AdminSession {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(
      live_session(req, ADMIN_SESSION_COOKIE).and_then(|(session_id, principal)| match principal {
        Principal::Admin { id, name, email } => Ok(AdminSession {
          session_id,
          admin_id: id,
          name,
          email,
        }),
        Principal::User { .. } => Err(AppError::Auth("Not authenticated".to_string())),
      }),
    )
  }
}

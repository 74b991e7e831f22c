// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::services::sessions::{Principal, ADMIN_SESSION_COOKIE};
use crate::state::AppState;
use crate::web::extractors::AdminSession;
use crate::web::responses;

#[derive(Deserialize, Debug)]
pub struct AdminLoginPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

#[instrument(name = "handler::admin_login", skip(app_state, req_payload), fields(email = %req_payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AdminLoginPayload>,
) -> Result<HttpResponse, AppError> {
  let admin = auth_service::authenticate_admin(app_state.store.as_ref(), &req_payload.email, &req_payload.password).await?;
  let session_id = app_state.sessions.create(Principal::Admin {
    id: admin.id,
    name: admin.name.clone(),
    email: admin.email.clone(),
  });
  info!(admin_id = admin.id, "Admin session opened.");

  Ok(
    HttpResponse::Ok()
      .cookie(responses::session_cookie(ADMIN_SESSION_COOKIE, session_id, app_state.config.session_ttl))
      .json(json!({ "status": 1, "message": "Login successful", "data": admin })),
  )
}

#[instrument(name = "handler::admin_logout", skip_all)]
pub async fn logout_handler(app_state: web::Data<AppState>, session: Option<AdminSession>) -> HttpResponse {
  if let Some(session) = session {
    app_state.sessions.destroy(&session.session_id);
  }
  HttpResponse::Ok()
    .cookie(responses::removal_cookie(ADMIN_SESSION_COOKIE))
    .json(json!({ "status": 1, "message": "Logged out successfully" }))
}

/// Fails with 401 unless an admin session is live.
#[instrument(name = "handler::admin_check_auth", skip_all)]
pub async fn check_auth_handler(session: AdminSession) -> HttpResponse {
  responses::ok(
    "Authenticated",
    json!({ "id": session.admin_id, "name": session.name, "email": session.email }),
  )
}

// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::{ProfileUpdate, User};
use crate::pipelines::{self, SignupRequest};
use crate::services::auth_service;
use crate::services::sessions::{Principal, USER_SESSION_COOKIE};
use crate::state::AppState;
use crate::web::extractors::UserSession;
use crate::web::responses;

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  /// Username or email.
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

fn principal_for(user: &User) -> Principal {
  Principal::User {
    id: user.id,
    username: user.username.clone(),
    email: user.email.clone(),
    full_name: user.full_name.clone(),
  }
}

fn session_user(user: &User) -> serde_json::Value {
  json!({
    "id": user.id,
    "username": user.username,
    "email": user.email,
    "full_name": user.full_name,
  })
}

#[instrument(name = "handler::signup", skip(app_state, req_payload), fields(username = %req_payload.username))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
  let user = pipelines::signup(&app_state, req_payload.into_inner()).await?;
  let session_id = app_state.sessions.create(principal_for(&user));
  info!(user_id = user.id, "Account created and session opened.");

  Ok(
    HttpResponse::Created()
      .cookie(responses::session_cookie(USER_SESSION_COOKIE, session_id, app_state.config.session_ttl))
      .json(json!({
        "status": 1,
        "message": "Account created successfully!",
        "user": session_user(&user),
        "logged_in": true,
      })),
  )
}

#[instrument(name = "handler::login", skip(app_state, req_payload), fields(login = %req_payload.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let user = pipelines::signin(&app_state, &req_payload.username, &req_payload.password).await?;
  let session_id = app_state.sessions.create(principal_for(&user));

  Ok(
    HttpResponse::Ok()
      .cookie(responses::session_cookie(USER_SESSION_COOKIE, session_id, app_state.config.session_ttl))
      .json(json!({
        "status": 1,
        "message": "Login successful!",
        "user": session_user(&user),
        "logged_in": true,
      })),
  )
}

#[instrument(name = "handler::logout", skip_all)]
pub async fn logout_handler(app_state: web::Data<AppState>, session: Option<UserSession>) -> HttpResponse {
  if let Some(session) = session {
    app_state.sessions.destroy(&session.session_id);
  }
  HttpResponse::Ok()
    .cookie(responses::removal_cookie(USER_SESSION_COOKIE))
    .json(json!({ "status": 1, "message": "Logged out successfully", "logged_in": false }))
}

/// Reports the live session, refreshing its expiry. A missing or expired
/// session is not an error here.
#[instrument(name = "handler::check_session", skip_all)]
pub async fn check_session_handler(session: Option<UserSession>) -> HttpResponse {
  match session {
    Some(session) => HttpResponse::Ok().json(json!({
      "status": 1,
      "logged_in": true,
      "user": {
        "id": session.user_id,
        "username": session.username,
        "email": session.email,
        "full_name": session.full_name,
      },
    })),
    None => HttpResponse::Ok()
      .cookie(responses::removal_cookie(USER_SESSION_COOKIE))
      .json(json!({ "status": 0, "logged_in": false, "message": "Session expired" })),
  }
}

#[instrument(name = "handler::get_profile", skip(app_state), fields(user_id = %path.as_ref()))]
pub async fn get_profile_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::get_profile(app_state.store.as_ref(), path.into_inner()).await?;
  Ok(responses::ok("User data retrieved successfully", user))
}

#[instrument(name = "handler::update_profile", skip(app_state, req_payload), fields(user_id = session.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  session: UserSession,
  req_payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::update_profile(app_state.store.as_ref(), session.user_id, req_payload.into_inner()).await?;
  app_state
    .sessions
    .replace_principal(&session.session_id, principal_for(&user));
  Ok(responses::ok("Profile updated successfully", user))
}

// storefront/src/pipelines/signup_pipeline.rs

use serde::Deserialize;
use storeflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use tracing::{event, info, instrument, warn, Level};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewUser, User};
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default, alias = "confirm_password")]
  pub confirm_password: String,
  #[serde(default, alias = "full_name")]
  pub full_name: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
}

/// Registers the user sign-up pipeline.
pub fn register_signup_pipeline(registry: &FlowRegistry<AppError>) {
  let mut signup_p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup", false),
    ("check_existing_user", false),
    ("create_user", false),
  ]);

  signup_p.on_root("validate_signup", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (username, email, password, confirm, full_name) = ctx_data.update(|c| {
        c.username = c.username.trim().to_string();
        c.email = c.email.trim().to_string();
        c.full_name = c.full_name.take().map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        (
          c.username.clone(),
          c.email.clone(),
          c.password.clone(),
          c.confirm_password.clone(),
          c.full_name.clone(),
        )
      });

      event!(Level::DEBUG, %username, "Validating signup input.");
      if username.chars().count() < 3 {
        return Err(AppError::Validation("Username must be at least 3 characters".to_string()));
      }
      if !auth_service::is_valid_email(&email) {
        return Err(AppError::Validation("Please provide a valid email".to_string()));
      }
      if password.chars().count() < 6 {
        return Err(AppError::Validation("Password must be at least 6 characters".to_string()));
      }
      if full_name.is_some_and(|n| n.chars().count() < 2) {
        return Err(AppError::Validation("Full name must be at least 2 characters".to_string()));
      }
      if password != confirm {
        return Err(AppError::Validation("Passwords do not match".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  signup_p.on_root("check_existing_user", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (store, username, email) =
        ctx_data.with(|c| (c.app_state.store.clone(), c.username.clone(), c.email.clone()));
      if store.user_exists(&username, &email).await? {
        warn!(%username, "Signup attempted with a taken username or email.");
        return Err(AppError::Validation("Username or email already exists".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signup_p.on_root("create_user", |ctx_data: ContextData<SignupCtxData>| {
    Box::pin(async move {
      let (store, password, new_user) = ctx_data.with(|c| {
        (
          c.app_state.store.clone(),
          c.password.clone(),
          NewUser {
            username: c.username.clone(),
            email: c.email.clone(),
            password_hash: String::new(),
            full_name: c.full_name.clone(),
            phone: c.phone.clone(),
            address: c.address.clone(),
          },
        )
      });
      let password_hash = auth_service::hash_password(&password)?;
      let user = store
        .insert_user(&NewUser {
          password_hash,
          ..new_user
        })
        .await?;
      info!(user_id = user.id, username = %user.username, "User created.");
      ctx_data.update(|c| c.created_user = Some(user));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(signup_p);
  tracing::info!("Sign-up pipeline registered.");
}

#[instrument(name = "signup", skip_all, fields(username = %request.username))]
pub async fn signup(app_state: &AppState, request: SignupRequest) -> AppResult<User> {
  let ctx_data = ContextData::new(SignupCtxData {
    app_state: app_state.clone(),
    username: request.username,
    email: request.email,
    password: request.password,
    confirm_password: request.confirm_password,
    full_name: request.full_name,
    phone: request.phone.filter(|p| !p.trim().is_empty()),
    address: request.address.filter(|a| !a.trim().is_empty()),
    created_user: None,
  });

  if app_state.flows.run(ctx_data.clone()).await? == PipelineResult::Stopped {
    return Err(AppError::Internal("Sign-up was halted by an internal step.".to_string()));
  }
  ctx_data
    .with(|c| c.created_user.clone())
    .ok_or_else(|| AppError::Internal("Sign-up completed without a user.".to_string()))
}

// storefront/src/pipelines/signin_pipeline.rs

use storeflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use tracing::{event, instrument, warn, Level};

use crate::errors::{AppError, Result as AppResult};
use crate::models::User;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

/// Registers the user sign-in pipeline. Unknown users and wrong passwords
/// fail with the same error.
pub fn register_signin_pipeline(registry: &FlowRegistry<AppError>) {
  let mut signin_p = Pipeline::<SigninCtxData, AppError>::new(&[("lookup_user", false), ("verify_password", false)]);

  signin_p.on_root("lookup_user", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (store, login, password_is_empty) = ctx_data.update(|c| {
        c.login = c.login.trim().to_string();
        (c.app_state.store.clone(), c.login.clone(), c.password.is_empty())
      });
      if login.is_empty() || password_is_empty {
        return Err(AppError::Validation(
          "Username/Email and password are required".to_string(),
        ));
      }

      match store.find_user_by_login(&login).await? {
        Some(user) => {
          event!(Level::DEBUG, user_id = user.id, "User found for signin.");
          ctx_data.update(|c| c.user = Some(user));
          Ok(PipelineControl::Continue)
        }
        None => {
          warn!(%login, "Signin for unknown user.");
          Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
        }
      }
    })
  });

  signin_p.on_root("verify_password", |ctx_data: ContextData<SigninCtxData>| {
    Box::pin(async move {
      let (stored_hash, password, user_id) = ctx_data.with(|c| {
        (
          c.user.as_ref().map(|u| u.password_hash.clone()),
          c.password.clone(),
          c.user.as_ref().map(|u| u.id),
        )
      });
      let stored_hash =
        stored_hash.ok_or_else(|| AppError::Internal("User missing before password check.".to_string()))?;

      if !auth_service::verify_password(&stored_hash, &password)? {
        warn!(?user_id, "Password mismatch on signin.");
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
      }
      event!(Level::INFO, ?user_id, "Password verified for signin.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(signin_p);
  tracing::info!("Sign-in pipeline registered.");
}

/// `login` is either a username or an email address.
#[instrument(name = "signin", skip(app_state, password))]
pub async fn signin(app_state: &AppState, login: &str, password: &str) -> AppResult<User> {
  let ctx_data = ContextData::new(SigninCtxData {
    app_state: app_state.clone(),
    login: login.to_string(),
    password: password.to_string(),
    user: None,
  });

  if app_state.flows.run(ctx_data.clone()).await? == PipelineResult::Stopped {
    return Err(AppError::Internal("Sign-in was halted by an internal step.".to_string()));
  }
  ctx_data
    .with(|c| c.user.clone())
    .ok_or_else(|| AppError::Internal("Sign-in completed without a user.".to_string()))
}

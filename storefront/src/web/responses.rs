// storefront/src/web/responses.rs

//! Success envelopes and session cookies. Error envelopes come from
//! `AppError`'s `ResponseError` impl.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// `200 {"status": 1, "message": .., "data": ..}`
pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": 1, "message": message, "data": data }))
}

pub fn message(message: &str) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": 1, "message": message }))
}

pub fn session_cookie(name: &'static str, session_id: String, ttl: Duration) -> Cookie<'static> {
  Cookie::build(name, session_id)
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .max_age(CookieDuration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)))
    .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
  let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
  cookie.make_removal();
  cookie
}

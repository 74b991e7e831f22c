// storefront/src/lib.rs

//! Storefront backend: order placement, payment verification, catalog and
//! account management over an actix-web JSON API.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

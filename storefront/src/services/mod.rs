// storefront/src/services/mod.rs

pub mod auth_service;
pub mod catalog;
pub mod gateway;
pub mod order_queries;
pub mod payment_mock;
pub mod payment_signature;
pub mod sessions;

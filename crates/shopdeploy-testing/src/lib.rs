//! Test utilities for ShopDeploy services.
//!
//! Dev-dependency only.

pub mod auth;

//! Auth types shared across ShopDeploy crates.
//!
//! Provides JWT encoding/validation, cookie builders, and the `Identity` extractor.

pub mod cookie;
pub mod identity;
pub mod token;

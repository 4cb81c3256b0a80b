//! Domain types shared across the ShopDeploy crates.
//!
//! Pure types with no framework dependencies: ids, roles, order statuses,
//! pricing, pagination and catalog sorting. Used by every layer of the
//! service and by the shared auth and testing crates.

pub mod category;
pub mod id;
pub mod order;
pub mod pagination;
pub mod pricing;
pub mod product;
pub mod user;

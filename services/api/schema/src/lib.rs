//! SeaORM entities for the storefront database.

pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod order_items;
pub mod order_status_history;
pub mod orders;
pub mod products;
pub mod users;

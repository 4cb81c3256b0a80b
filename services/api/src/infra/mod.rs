pub mod db;
pub mod payment;

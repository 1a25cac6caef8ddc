pub mod aggregate;
pub mod bidding;
pub mod database;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod pricing;
pub mod query;
pub mod scheduler;

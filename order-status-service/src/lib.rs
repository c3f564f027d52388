pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod handlers;
pub mod models;
pub mod order_api;
pub mod queue;
pub mod repository;
pub mod schema;
pub mod store;
pub mod usecase;

#[cfg(test)]
mod testing;

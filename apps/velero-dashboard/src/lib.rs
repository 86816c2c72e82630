pub mod auth;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod flash;
pub mod normalize;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod static_assets;
pub mod sweeper;
pub mod velero;
pub mod views;

#[cfg(test)]
pub mod test_support;

pub mod auth;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod server;
pub mod state;
pub mod testers;
pub mod types;

#[cfg(test)]
pub mod testing;

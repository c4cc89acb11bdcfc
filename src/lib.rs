pub mod activity;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod membership;
pub mod models;
pub mod platforms;
pub mod routes;
pub mod schema;
pub mod state;

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod generators;
pub mod http;
pub mod logging;
pub mod models;
pub mod seeds;
pub mod state;

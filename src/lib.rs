pub mod api;
pub mod approval;
pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod models;
pub mod report;
pub mod routes;
pub mod utils;

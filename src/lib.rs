pub mod api;
pub mod charts;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod http_client;
pub mod models;
pub mod persist;
pub mod state;
pub mod transfer_planner;
pub mod wildcard;

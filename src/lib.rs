pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod extract;
pub mod feed;
pub mod gateway;
pub mod identity;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod runner;
pub mod server;
pub mod store;
pub mod tools;
pub mod validate;
pub mod view;

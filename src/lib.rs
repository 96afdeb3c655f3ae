pub mod app;
pub mod catalog;
pub mod clade;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod formats;
pub mod import;
pub mod model;
pub mod output;
pub mod slug;
pub mod store;

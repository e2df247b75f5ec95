pub mod app;
pub mod catalog;
pub mod config;
pub mod epg;
pub mod errors;
pub mod filter;
pub mod models;
pub mod player;
pub mod services;
pub mod sources;
pub mod storage;
pub mod utils;

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod encoding;
pub mod models;
pub mod redirect;
pub mod service;
pub mod storage;

pub mod api;
pub mod checker;
pub mod config;
pub mod data_models;
pub mod extractor;
pub mod fetcher;
pub mod report;
pub mod search;
pub mod sheets;

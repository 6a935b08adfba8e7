pub mod config;
pub mod db;
pub mod fetch_error;
pub mod fetcher;
pub mod reshaper;
pub mod services;

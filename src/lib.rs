pub mod api;
pub mod config;
pub mod db;
pub mod market;
pub mod monitoring;
pub mod reconcile;

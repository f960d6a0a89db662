pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod storage;
pub mod store;
pub mod validation;

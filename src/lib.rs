pub mod broadcast;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod operations;
pub mod planner;
pub mod recipients;
pub mod rpc;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod tx_builder;

pub use config::JobConfig;
pub use errors::SprayError;

pub type Result<T> = std::result::Result<T, SprayError>;

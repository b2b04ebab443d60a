pub mod config;
pub mod engine;
pub mod limits;
pub mod lots;
pub mod model;
pub mod notify;
pub mod observability;

pub mod backend;
pub mod config;
pub mod error;
pub mod import;
pub mod relay;
pub mod roles;
pub mod session;
pub mod telemetry;
pub mod workflows;

pub mod app_config;
pub mod telemetry;

pub use app_config::Config;
pub use telemetry::init_tracing;

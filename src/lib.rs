mod routes;

pub mod app;
pub mod codec;
pub mod config;
pub mod detection;
pub mod logging;
pub mod server;
pub mod service;
pub mod telemetry;

pub use app::start_app;
pub use routes::{ErrorBody, IMAGE_FIELD};
pub use server::{build_router, SharedState};

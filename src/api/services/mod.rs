pub mod functions;
pub mod health;
pub mod media;
pub mod v1;

pub use functions::functions_routes;
pub use health::{AppStartTime, HealthService, health_routes};
pub use media::media_routes;
pub use v1::api_v1_routes;

//! gRPC services exposed to Envoy Gateway.

mod extension;
mod health;

pub use extension::HookService;
pub use health::{HealthService, SERVER_NAME};

//! `grpc.health.v1.Health` for the extension server.
//!
//! Envoy Gateway only calls `Check`; the server is considered serving as
//! soon as it accepts connections.

use crate::xds::proto::{
    Health, HealthCheckRequest, HealthCheckResponse, HealthListRequest, HealthListResponse,
};
use std::pin::Pin;
use tokio_stream::Stream;
use tonic::{Request, Response, Status};

/// Name reported by `List`.
pub const SERVER_NAME: &str = "envoy-gateway-extension-server";

#[derive(Debug, Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }
}

#[tonic::async_trait]
impl Health for HealthService {
    type WatchStream =
        Pin<Box<dyn Stream<Item = std::result::Result<HealthCheckResponse, Status>> + Send>>;

    async fn check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> std::result::Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse::serving()))
    }

    async fn list(
        &self,
        _request: Request<HealthListRequest>,
    ) -> std::result::Result<Response<HealthListResponse>, Status> {
        let statuses = [(SERVER_NAME.to_string(), HealthCheckResponse::serving())].into();
        Ok(Response::new(HealthListResponse { statuses }))
    }

    async fn watch(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> std::result::Result<Response<Self::WatchStream>, Status> {
        Err(Status::unimplemented("Watch is not implemented"))
    }
}

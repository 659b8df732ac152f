// Generates the gRPC service stubs served by the extension server.
//
// Message types are hand-written prost structs in `src/xds/proto.rs` that embed
// the Envoy resources from `envoy-types`, so only the service plumbing needs
// to be generated here.

const PROST_CODEC: &str = "tonic_prost::ProstCodec";

fn main() {
    let extension = tonic_build::manual::Service::builder()
        .name("EnvoyGatewayExtension")
        .package("envoygateway.extension")
        .method(
            tonic_build::manual::Method::builder()
                .name("post_translate_modify")
                .route_name("PostTranslateModify")
                .input_type("crate::xds::proto::PostTranslateModifyRequest")
                .output_type("crate::xds::proto::PostTranslateModifyResponse")
                .codec_path(PROST_CODEC)
                .build(),
        )
        .build();

    let health = tonic_build::manual::Service::builder()
        .name("Health")
        .package("grpc.health.v1")
        .method(
            tonic_build::manual::Method::builder()
                .name("check")
                .route_name("Check")
                .input_type("crate::xds::proto::HealthCheckRequest")
                .output_type("crate::xds::proto::HealthCheckResponse")
                .codec_path(PROST_CODEC)
                .build(),
        )
        .method(
            tonic_build::manual::Method::builder()
                .name("list")
                .route_name("List")
                .input_type("crate::xds::proto::HealthListRequest")
                .output_type("crate::xds::proto::HealthListResponse")
                .codec_path(PROST_CODEC)
                .build(),
        )
        .method(
            tonic_build::manual::Method::builder()
                .name("watch")
                .route_name("Watch")
                .input_type("crate::xds::proto::HealthCheckRequest")
                .output_type("crate::xds::proto::HealthCheckResponse")
                .codec_path(PROST_CODEC)
                .server_streaming()
                .build(),
        )
        .build();

    tonic_build::manual::Builder::new().compile(&[extension, health]);

    println!("cargo:rerun-if-changed=build.rs");
}

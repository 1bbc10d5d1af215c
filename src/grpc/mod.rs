//! gRPC client module

mod client;

pub use client::StreamingGatewayClient;

// Re-export protobuf types
pub mod diagmon {
    tonic::include_proto!("diagmon");
}

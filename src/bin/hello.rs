//! Lambda entrypoint for the probe function behind `/hello` and `/{thingName}/test`.
//!
//! Needs no configuration or AWS clients; it only echoes the request.

use iot_device_provisioner::echo_request;
use lambda_http::{run, service_fn, Error as LambdaError};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .json()
        .with_current_span(false)
        .init();

    run(service_fn(echo_request)).await
}

//! Lambda entrypoint for the certificate issuance function.
//!
//! The binary initialises logging, resolves the issuer configuration from the
//! environment, builds an AWS IoT client for the configured region, and then
//! hands execution to `lambda_http`. Each invocation reuses the `AppContext`
//! so the SDK client and configuration are cached across requests.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use iot_device_provisioner::{
    config::IssuerConfig, handle_request, lambda_error, registry::IotRegistry, AppContext,
};
use lambda_http::{run, service_fn, Error as LambdaError};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .json()
        .with_current_span(false)
        .init();

    let config = IssuerConfig::from_env().map_err(lambda_error)?;
    info!(
        region = config.region(),
        resolution = %config.region_source(),
        account_id = config.account_id(),
        stage = %config.stage(),
        production = config.stage().is_production(),
        policy_name = config.policy_name(),
        "initialising Lambda runtime"
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region().to_owned()))
        .load()
        .await;
    let registry = IotRegistry::new(aws_sdk_iot::Client::new(&sdk_config));

    let ctx = Arc::new(AppContext::new(Arc::new(registry), config));

    run(service_fn(move |event| {
        let ctx = ctx.clone();
        async move { handle_request(ctx, event).await }
    }))
    .await
}

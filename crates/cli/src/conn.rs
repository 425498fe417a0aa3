use crate::error::CliError;
use engine_runtime::execution::{
    executor::{open_destination, open_source},
    factory::ConnectionProvider,
};
use tracing::info;

/// Opens and probes both endpoints, one after the other. Handles are dropped
/// right after their probe.
pub async fn ping_endpoints(provider: &dyn ConnectionProvider) -> Result<(), CliError> {
    info!("Pinging source at '{}'", provider.source_endpoint());
    drop(open_source(provider).await?);
    info!("Source ping to '{}' succeeded", provider.source_endpoint());

    info!("Pinging destination at '{}'", provider.destination_endpoint());
    drop(open_destination(provider).await?);
    info!(
        "Destination ping to '{}' succeeded",
        provider.destination_endpoint()
    );
    Ok(())
}

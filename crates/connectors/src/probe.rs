use crate::error::DbError;
use async_trait::async_trait;

/// A trivial round trip used to verify a connection before it is used.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;
}

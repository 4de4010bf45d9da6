use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::datastore::{Datastore, DatastoreError, Filter, FindQuery};
use crate::rest::document::Document;

/// Wraps a [`Datastore`] and bounds every call with a timeout. Failures are
/// handed back as-is; nothing is retried here.
#[derive(Clone)]
pub struct DatastoreClient {
    store: Arc<dyn Datastore>,

    /// Upper bound for a single call
    call_timeout: Duration,
}

impl DatastoreClient {
    pub fn new(store: Arc<dyn Datastore>, call_timeout: Duration) -> Self {
        Self { store, call_timeout }
    }

    pub async fn find(&self, source: &str, query: &FindQuery) -> Result<Vec<Document>, DatastoreError> {
        self.bounded("find", source, self.store.find(source, query)).await
    }

    pub async fn count(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.bounded("count", source, self.store.count(source, filter)).await
    }

    pub async fn remove(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.bounded("remove", source, self.store.remove(source, filter)).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        source: &str,
        call: impl Future<Output = Result<T, DatastoreError>>,
    ) -> Result<T, DatastoreError> {
        match timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => {
                tracing::trace!(operation, source, "Datastore call completed");
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::warn!(operation, source, error = %e, "Datastore call failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    operation,
                    source,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Datastore call timed out"
                );
                Err(DatastoreError::Timeout(self.call_timeout))
            }
        }
    }
}

//! Poll lifecycle, vote registration, aggregation and statistics.
//!
//! Every inbound operation comes in the shape handlers expect: refusals are
//! `None`, `false` or an empty list, and only persistence failures surface as
//! `Err`. `try_*` variants keep the refusal reason for callers that need it.

pub mod aggregate;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod query;
pub mod registry;
pub mod seed;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use polly_db::PollStore;

pub use error::{CoreResult, PollError, ValidationError};
pub use locks::PollLocks;

pub struct PollService<S> {
    store: Arc<S>,
    locks: PollLocks,
}

impl<S: PollStore> PollService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: PollLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop all polls and votes. Test utility.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset()?;
        info!("Poll store reset");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use crate::testing::{create, service};
    use polly_db::PollStore;

    #[tokio::test]
    async fn reset_clears_polls() {
        let service = service();
        create(&service, &["a", "b"], "user-1").await;
        service.reset().await.unwrap();
        assert!(service.store().list_polls().unwrap().is_empty());
        assert_eq!(service.store().count_users().unwrap(), 3);
    }
}

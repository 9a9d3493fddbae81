//! Confirmation dialog for clearing completed tasks.

use crate::error::StoreResult;
use crate::store::TaskStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct DeleteAllCompletedModel<S: TaskStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TaskStore + ?Sized> DeleteAllCompletedModel<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete every completed task.
    ///
    /// Runs as its own Tokio task so the deletion completes even if the dialog
    /// goes away before it finishes.
    pub fn on_confirm_click(&self) -> JoinHandle<StoreResult<usize>> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let removed = store.delete_completed().await?;
            info!(removed, "Deleted completed tasks");
            Ok(removed)
        })
    }
}

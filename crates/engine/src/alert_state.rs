use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{BudgetKey, BudgetStatus, stores::AlertStateStore};

/// In-process alert state. Lost on restart, which only means the next
/// observation of each budget is treated as a first observation.
#[derive(Debug, Default)]
pub struct MemoryAlertState {
    statuses: RwLock<HashMap<BudgetKey, BudgetStatus>>,
}

impl MemoryAlertState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStateStore for MemoryAlertState {
    async fn swap(&self, key: BudgetKey, status: BudgetStatus) -> Option<BudgetStatus> {
        self.statuses.write().await.insert(key, status)
    }

    async fn forget(&self, key: BudgetKey) {
        self.statuses.write().await.remove(&key);
    }
}

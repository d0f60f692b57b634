use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

const PRUNE_AT: usize = 1024;

/// One async mutex per couple, so read-decay-act-write runs serialized per pet.
#[derive(Clone, Default)]
pub struct PetLocks {
    slots: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl PetLocks {
    pub async fn acquire(&self, couple_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock();
            if slots.len() >= PRUNE_AT {
                // only the map itself holds idle slots
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            slots.entry(couple_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

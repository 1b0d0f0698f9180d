use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::signal::{SignalBuffer, ViewerError};

pub type BufferKey = String;

/// Shared map of uploaded or synthesised recordings.
///
/// Values are immutable snapshots: a writer swaps in a whole new `Arc`, so a
/// reader never sees a partially written buffer.
#[derive(Default)]
pub struct BufferStore {
    buffers: RwLock<HashMap<BufferKey, Arc<SignalBuffer>>>,
    next_id: AtomicU64,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under a fresh key and return it.
    pub fn insert(&self, buffer: SignalBuffer) -> BufferKey {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = format!("buf-{id:08x}");
        self.put(key.clone(), buffer);
        key
    }

    /// Store under `key`, replacing any previous snapshot.
    pub fn put(&self, key: BufferKey, buffer: SignalBuffer) {
        let mut map = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key, Arc::new(buffer));
    }

    pub fn get(&self, key: &str) -> Result<Arc<SignalBuffer>, ViewerError> {
        let map = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key)
            .cloned()
            .ok_or_else(|| ViewerError::UnknownBuffer(key.to_string()))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<SignalBuffer>> {
        let mut map = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(key)
    }

    pub fn len(&self) -> usize {
        self.buffers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn buffer(value: f64) -> SignalBuffer {
        SignalBuffer::new(vec![vec![value; 16]], 100).unwrap()
    }

    #[test]
    fn insert_get_remove() {
        let store = BufferStore::new();
        let a = store.insert(buffer(1.0));
        let b = store.insert(buffer(2.0));
        assert_ne!(a, b);
        assert_eq!(store.get(&b).unwrap().samples()[0][0], 2.0);
        assert!(store.remove(&a).is_some());
        assert!(matches!(store.get(&a), Err(ViewerError::UnknownBuffer(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn readers_see_whole_snapshots() {
        let store = Arc::new(BufferStore::new());
        store.put("rec".into(), buffer(0.0));
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 1..200 {
                    store.put("rec".into(), buffer(i as f64));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = store.get("rec").unwrap();
                        let first = snap.samples()[0][0];
                        assert!(snap.samples()[0].iter().all(|v| *v == first));
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}

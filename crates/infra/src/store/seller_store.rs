use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use siftledger_core::SellerId;

/// Seller-isolated key/value store for first-class entities keyed by
/// `(seller, entity id)`.
///
/// `list` returns a seller's values in first-insertion order; updating an
/// existing key keeps its position.
pub trait SellerStore<K, V>: Send + Sync {
    fn get(&self, seller_id: SellerId, key: &K) -> Option<V>;
    fn list(&self, seller_id: SellerId) -> Vec<V>;
    /// Write several entries for one seller. Readers observe either none or all of them.
    fn upsert_batch(&self, seller_id: SellerId, entries: Vec<(K, V)>);

    fn upsert(&self, seller_id: SellerId, key: K, value: V) {
        self.upsert_batch(seller_id, vec![(key, value)]);
    }
}

impl<K, V, S> SellerStore<K, V> for Arc<S>
where
    S: SellerStore<K, V> + ?Sized,
{
    fn get(&self, seller_id: SellerId, key: &K) -> Option<V> {
        (**self).get(seller_id, key)
    }

    fn list(&self, seller_id: SellerId) -> Vec<V> {
        (**self).list(seller_id)
    }

    fn upsert_batch(&self, seller_id: SellerId, entries: Vec<(K, V)>) {
        (**self).upsert_batch(seller_id, entries)
    }
}

#[derive(Debug)]
struct Slot<V> {
    seq: u64,
    value: V,
}

#[derive(Debug)]
struct Inner<K, V> {
    next_seq: u64,
    map: HashMap<(SellerId, K), Slot<V>>,
}

/// In-memory seller-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemorySellerStore<K, V> {
    inner: RwLock<Inner<K, V>>,
}

impl<K, V> InMemorySellerStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_seq: 0,
                map: HashMap::new(),
            }),
        }
    }
}

impl<K, V> Default for InMemorySellerStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SellerStore<K, V> for InMemorySellerStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, seller_id: SellerId, key: &K) -> Option<V> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .map
            .get(&(seller_id, key.clone()))
            .map(|slot| slot.value.clone())
    }

    fn list(&self, seller_id: SellerId) -> Vec<V> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut slots: Vec<&Slot<V>> = inner
            .map
            .iter()
            .filter_map(|((s, _k), slot)| if *s == seller_id { Some(slot) } else { None })
            .collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.value.clone()).collect()
    }

    fn upsert_batch(&self, seller_id: SellerId, entries: Vec<(K, V)>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *guard;
        for (key, value) in entries {
            match inner.map.get_mut(&(seller_id, key.clone())) {
                Some(slot) => slot.value = value,
                None => {
                    let seq = inner.next_seq;
                    inner.next_seq += 1;
                    inner.map.insert((seller_id, key), Slot { seq, value });
                }
            }
        }
    }
}

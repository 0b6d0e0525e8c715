use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Mutual-exclusion scopes for ledger operations
///
/// A global lock taken shared by per-item operations and exclusively by
/// pantry-wide ones, plus one lock per item name. A name's entry lives only
/// while some operation holds or waits on it. Guards only protect `()`, so
/// poisoning is ignored.
#[derive(Debug, Default)]
pub(crate) struct ItemLocks {
    global: RwLock<()>,
    items: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

/// A checked-out per-item lock, dropped from the registry on release when
/// nobody else holds it
struct ItemSlot<'a> {
    locks: &'a ItemLocks,
    name: &'a str,
    lock: Arc<RwLock<()>>,
}

impl Drop for ItemSlot<'_> {
    fn drop(&mut self) {
        let mut items = self.locks.items.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here
        if Arc::strong_count(&self.lock) == 2 {
            items.remove(self.name);
        }
    }
}

impl ItemLocks {
    fn item<'a>(&'a self, name: &'a str) -> ItemSlot<'a> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(items.entry(name.to_string()).or_default());
        ItemSlot {
            locks: self,
            name,
            lock,
        }
    }

    /// Run `f` with exclusive access to one item
    pub fn with_item_write<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let _global = self.global.read().unwrap_or_else(PoisonError::into_inner);
        let slot = self.item(name);
        let _item = slot.lock.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` with shared access to one item
    pub fn with_item_read<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let _global = self.global.read().unwrap_or_else(PoisonError::into_inner);
        let slot = self.item(name);
        let _item = slot.lock.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` with every item locked out
    pub fn with_all_write<T>(&self, f: impl FnOnce() -> T) -> T {
        let _global = self.global.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

//! Lease registry -- tracks which physical resources are checked out.
//!
//! The registry never owns a leased resource. Each grant hands out a
//! [`Lease`] token holding the only strong reference; the registry keeps a
//! [`Weak`] to it. Once the handle carrying the token is dropped the weak
//! reference dies and the key is free again, with no release call.
//!
//! The same registry type backs both pin-level leases (`LeaseRegistry<Pin>`)
//! and hardware PWM channel leases (`LeaseRegistry<PwmChannel>`).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace};

/// Proof that `key` is checked out. Dropping it releases the lease.
pub struct Lease<K: fmt::Display> {
    key: K,
    _alive: Arc<()>,
}

impl<K: fmt::Display + Copy> Lease<K> {
    /// The leased key.
    pub fn key(&self) -> K {
        self.key
    }
}

impl<K: fmt::Display> Drop for Lease<K> {
    fn drop(&mut self) {
        debug!(key = %self.key, "lease released");
    }
}

impl<K: fmt::Display> fmt::Debug for Lease<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lease({})", self.key)
    }
}

/// Key → liveness reference map with serialized acquire.
pub struct LeaseRegistry<K> {
    entries: Mutex<HashMap<K, Weak<()>>>,
}

impl<K> LeaseRegistry<K>
where
    K: Copy + Eq + Hash + fmt::Display,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Lease `key` and build the handle that will carry the lease.
    ///
    /// The whole check-build-insert sequence runs under the registry lock, so
    /// two threads can never both observe `key` as free. If a stale entry is
    /// found (its handle is gone) it is collected first. `in_use` produces the
    /// error when a live handle exists; if `build` fails the lease is dropped
    /// and nothing is recorded.
    pub fn acquire<T, E>(
        &self,
        key: K,
        in_use: impl FnOnce(K) -> E,
        build: impl FnOnce(Lease<K>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut entries = self.entries.lock().unwrap();

        if let Some(existing) = entries.get(&key) {
            if existing.strong_count() > 0 {
                return Err(in_use(key));
            }
            trace!(key = %key, "collecting stale lease");
            entries.remove(&key);
        }

        let alive = Arc::new(());
        let weak = Arc::downgrade(&alive);
        let handle = build(Lease { key, _alive: alive })?;

        entries.insert(key, weak);
        debug!(key = %key, "lease granted");
        Ok(handle)
    }

    /// Returns `true` if a live handle currently holds `key`.
    pub fn is_leased(&self, key: K) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(&key)
            .is_some_and(|w| w.strong_count() > 0)
    }

    /// Keys with a live handle, in no particular order.
    pub fn active_keys(&self) -> Vec<K> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, w)| w.strong_count() > 0)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Remove entries whose handle is gone.
    pub fn sweep(&self) {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, w| w.strong_count() > 0);
    }

    /// Number of tracked entries, stale ones included (for testing).
    #[cfg(test)]
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl<K> Default for LeaseRegistry<K>
where
    K: Copy + Eq + Hash + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

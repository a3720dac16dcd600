// SPDX-License-Identifier: CEPL-1.0

/// Holds at most one value together with the key it was built for.
///
/// [`ensure`](Self::ensure) rebuilds only when the key changes. The stale
/// value is dropped before the new one is built, so two generations never
/// coexist in the cache.
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    entry: Option<(K, V)>,
    builds: u64,
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self {
            entry: None,
            builds: 0,
        }
    }
}

impl<K: PartialEq + Clone, V> KeyedCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure<E>(
        &mut self,
        key: &K,
        build: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<&V, E> {
        match self.entry.take() {
            Some((cached, value)) if cached == *key => Ok(&self.entry.insert((cached, value)).1),
            stale => {
                drop(stale);
                let value = build(key)?;
                self.builds += 1;
                Ok(&self.entry.insert((key.clone(), value)).1)
            }
        }
    }

    pub fn get(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, v)| v)
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    /// Drops the cached value. Returns whether there was one.
    pub fn release(&mut self) -> bool {
        self.entry.take().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Number of times a value has been built.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

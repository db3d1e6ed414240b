use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
pub struct RunCache<K, V> {
    entries: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K: Eq + Hash, V: Clone> RunCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// A failed fetch leaves the cache untouched.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(value.clone());
        }
        self.misses += 1;
        let value = fetch()?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl<K: Eq + Hash, V: Clone> Default for RunCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetches_once_per_key() {
        let mut cache = RunCache::<String, bool>::new();
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with("GBIF:1".to_string(), || {
                    calls += 1;
                    Ok::<_, ()>(true)
                })
                .unwrap();
            assert!(value);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = RunCache::<&str, u32>::new();
        let err = cache.get_or_try_insert_with("k", || Err("down"));
        assert_eq!(err, Err("down"));
        assert!(cache.is_empty());
        let value = cache.get_or_try_insert_with("k", || Ok::<_, &str>(7));
        assert_eq!(value, Ok(7));
    }
}

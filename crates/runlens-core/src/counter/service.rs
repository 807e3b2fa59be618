use std::collections::BTreeMap;

use tracing::trace;

use crate::counter::{CounterError, CounterKey, CounterSet, MetricPath, PATH_SEPARATOR};

/// Generic counter store.
///
/// Keeps one [`CounterSet`] per path seen so far. The overall path is always present.
#[derive(Debug, Clone)]
pub struct MetricCounterService<K: CounterKey> {
    overall: MetricPath,
    counters: BTreeMap<MetricPath, CounterSet<K>>,
}

impl<K: CounterKey> MetricCounterService<K> {
    /// Create a store whose aggregate scope lives at `overall`.
    pub fn new(overall: &str) -> Result<Self, CounterError> {
        let overall = MetricPath::parse(overall)?;
        let mut counters = BTreeMap::new();
        counters.insert(overall.clone(), CounterSet::zeroed());
        Ok(Self { overall, counters })
    }

    /// Path of the aggregate scope.
    pub fn overall(&self) -> &MetricPath {
        &self.overall
    }

    /// Increment `key` at a dot-delimited `path`, creating the path on first use.
    ///
    /// A malformed path is rejected before any state is touched.
    pub fn increment(&mut self, key: K, path: &str) -> Result<(), CounterError> {
        let path = MetricPath::parse(path)?;
        self.increment_at(key, &path);
        Ok(())
    }

    /// Increment `key` at an already validated path.
    pub fn increment_at(&mut self, key: K, path: &MetricPath) {
        match self.counters.get_mut(path.as_str()) {
            Some(set) => set.increment(key),
            None => {
                trace!(path = %path, "registering counter path");
                let mut set = CounterSet::zeroed();
                set.increment(key);
                self.counters.insert(path.clone(), set);
            }
        }
    }

    /// All-zero shape: the overall scope only.
    pub fn initial_metrics(&self) -> CounterSnapshot<K> {
        let mut counters = BTreeMap::new();
        counters.insert(self.overall.clone(), CounterSet::zeroed());
        CounterSnapshot { counters }
    }

    /// Owned copy of the current state.
    pub fn collect(&self) -> CounterSnapshot<K> {
        CounterSnapshot {
            counters: self.counters.clone(),
        }
    }

    /// Zero every key on every known path. Paths stay registered.
    pub fn reset(&mut self) {
        for set in self.counters.values_mut() {
            set.reset();
        }
    }

    /// Every path observed so far, in lexical order.
    pub fn paths(&self) -> impl Iterator<Item = &MetricPath> {
        self.counters.keys()
    }
}

/// Immutable copy of a [`MetricCounterService`] state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot<K: CounterKey> {
    counters: BTreeMap<MetricPath, CounterSet<K>>,
}

impl<K: CounterKey> CounterSnapshot<K> {
    /// Counters registered at exactly `path`.
    pub fn get(&self, path: &str) -> Option<&CounterSet<K>> {
        self.counters.get(path)
    }

    /// Direct children of `prefix`, yielded as `(segment, counters)`.
    pub fn children<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a CounterSet<K>)> + 'a {
        self.counters.iter().filter_map(move |(path, set)| {
            let rest = path
                .as_str()
                .strip_prefix(prefix)?
                .strip_prefix(PATH_SEPARATOR)?;
            (!rest.contains(PATH_SEPARATOR)).then_some((rest, set))
        })
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

use std::{fmt, marker::PhantomData};

/// Closed set of counter names.
///
/// Implemented by enums; `ALL[k.index()] == k` must hold for every key.
pub trait CounterKey: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every legal key, in index order.
    const ALL: &'static [Self];

    /// Position of the key in [`CounterKey::ALL`].
    fn index(self) -> usize;

    /// Serialized counter name.
    fn as_str(self) -> &'static str;
}

/// One value per legal key of `K`.
#[derive(Clone, PartialEq, Eq)]
pub struct CounterSet<K> {
    values: Vec<u64>,
    _key: PhantomData<K>,
}

impl<K: CounterKey> CounterSet<K> {
    /// All keys at zero.
    pub fn zeroed() -> Self {
        Self {
            values: vec![0; K::ALL.len()],
            _key: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, key: K) -> u64 {
        self.values[key.index()]
    }

    #[inline]
    pub fn increment(&mut self, key: K) {
        let slot = &mut self.values[key.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.values.fill(0);
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u64)> + '_ {
        K::ALL.iter().map(|k| (*k, self.get(*k)))
    }
}

impl<K: CounterKey> Default for CounterSet<K> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<K: CounterKey> fmt::Debug for CounterSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k.as_str(), v)))
            .finish()
    }
}

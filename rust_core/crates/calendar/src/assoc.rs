//! Fixed-capacity associative cache with double hashing.
//!
//! The table never grows: `size = next_prime(2 * capacity)` slots are
//! allocated up front and a new key is refused once `capacity` live entries
//! are stored. Because `size` is prime and the step hash is never a multiple
//! of it, every probe sequence visits every slot, so lookups within capacity
//! always terminate.
//!
//! The sorted variant ([`AssocCache::with_sorted`]) also keeps its keys in
//! order and answers [`AssocCache::ordinal_index`] by binary search. The
//! calendar and the split lists use it to round a date to its neighbour.

use crate::error::CacheError;

/// Longest key accepted by the cache, in bytes.
pub const MAX_KEY_LEN: usize = 16;

const HASH_BASE_1: u64 = 151;
const HASH_BASE_2: u64 = 163;

/// Calendar payload: sequential numbers of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CalendarInfo {
    /// Sequential calendar day number, 0 at the start of the table
    pub day_number: i64,
    /// Sequential business day number; holidays repeat the previous number
    pub busday_number: i64,
    /// Whether the exchange trades on this day
    pub is_busday: bool,
}

impl CalendarInfo {
    /// Decodes the packed storage form.
    ///
    /// The low 16 bits of `|info|` hold the day number, the next 15 bits the
    /// business day number, and a negative value marks a holiday.
    #[must_use]
    pub fn from_packed(info: i32) -> Self {
        let raw = i64::from(info).abs();
        Self {
            day_number: raw & 0xffff,
            busday_number: (raw >> 16) & 0x7fff,
            is_busday: info >= 0,
        }
    }

    /// Encodes into the packed storage form.
    ///
    /// Numbers wider than their fields are masked.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn packed(&self) -> i32 {
        let raw = ((self.busday_number & 0x7fff) << 16) | (self.day_number & 0xffff);
        let raw = raw as i32;
        if self.is_busday { raw } else { -raw }
    }
}

/// Value stored in an [`AssocCache`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CacheValue {
    /// Split ratio
    Ratio(f64),
    /// Calendar numbers of a date
    Calendar(CalendarInfo),
    /// Index into a caller-owned collection
    Handle(usize),
    /// Free text
    Text(String),
}

#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: String, value: CacheValue },
}

/// Open-addressing cache keyed by short strings.
#[derive(Debug, Clone)]
pub struct AssocCache {
    slots: Vec<Slot>,
    capacity: usize,
    count: usize,
    sorted: Option<Vec<String>>,
}

impl AssocCache {
    /// Creates an empty cache able to hold `capacity` keys.
    ///
    /// # Errors
    /// Returns [`CacheError::ZeroCapacity`] when `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        let size = next_prime(2 * capacity);
        Ok(Self {
            slots: vec![Slot::Empty; size],
            capacity,
            count: 0,
            sorted: None,
        })
    }

    /// Builds a cache that also keeps its keys in sorted order.
    ///
    /// Capacity equals the number of entries, so nothing can be added later.
    ///
    /// # Errors
    /// - [`CacheError::ZeroCapacity`] when `entries` is empty.
    /// - [`CacheError::UnsortedKeys`] unless keys are strictly increasing.
    /// - [`CacheError::KeyTooLong`] for an oversized key.
    pub fn with_sorted(entries: Vec<(String, CacheValue)>) -> Result<Self, CacheError> {
        let mut cache = Self::new(entries.len())?;
        let mut keys: Vec<String> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Some(prev) = keys.last()
                && *prev >= key
            {
                return Err(CacheError::UnsortedKeys {
                    prev: prev.clone(),
                    next: key,
                });
            }
            cache.insert(&key, value)?;
            keys.push(key);
        }
        cache.sorted = Some(keys);
        Ok(cache)
    }

    /// Inserts `value` under `key`, returning the previous value if the key
    /// was already present.
    ///
    /// # Errors
    /// - [`CacheError::KeyTooLong`] for keys longer than [`MAX_KEY_LEN`].
    /// - [`CacheError::CapacityExceeded`] when a new key would exceed the
    ///   declared capacity.
    pub fn insert(&mut self, key: &str, value: CacheValue) -> Result<Option<CacheValue>, CacheError> {
        check_key(key)?;
        let size = self.slots.len();
        let mut free = None;
        for attempt in 0..size {
            let index = probe_index(key, size, attempt);
            match &mut self.slots[index] {
                Slot::Empty => {
                    free.get_or_insert(index);
                    break;
                }
                Slot::Tombstone => {
                    free.get_or_insert(index);
                }
                Slot::Occupied { key: k, value: v } if k == key => {
                    return Ok(Some(std::mem::replace(v, value)));
                }
                Slot::Occupied { .. } => {}
            }
        }
        if self.count >= self.capacity {
            return Err(CacheError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let Some(index) = free else {
            return Err(CacheError::CapacityExceeded {
                capacity: self.capacity,
            });
        };
        self.slots[index] = Slot::Occupied {
            key: key.to_string(),
            value,
        };
        self.count += 1;
        Ok(None)
    }

    /// Looks up `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.find(key).and_then(|index| match &self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        })
    }

    /// True if `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Removes `key`, leaving a tombstone so later probes keep walking.
    pub fn remove(&mut self, key: &str) -> Option<CacheValue> {
        let index = self.find(key)?;
        let Slot::Occupied { value, .. } = std::mem::replace(&mut self.slots[index], Slot::Tombstone)
        else {
            return None;
        };
        self.count -= 1;
        if let Some(sorted) = self.sorted.as_mut()
            && let Ok(pos) = sorted.binary_search_by(|k| k.as_str().cmp(key))
        {
            sorted.remove(pos);
        }
        Some(value)
    }

    /// Position of `key` in the sorted key list, rounding down.
    ///
    /// Returns the exact position when `key` is present, the position of its
    /// predecessor when it falls between two keys, and the last position when
    /// it sorts after every key. Returns `None` for an empty list, a key below
    /// the first one, or a cache built without [`AssocCache::with_sorted`].
    #[must_use]
    pub fn ordinal_index(&self, key: &str) -> Option<usize> {
        let sorted = self.sorted.as_ref()?;
        match sorted.binary_search_by(|k| k.as_str().cmp(key)) {
            Ok(pos) => Some(pos),
            Err(0) => None,
            Err(pos) => Some(pos - 1),
        }
    }

    /// Sorted keys, if this is the sorted variant.
    #[must_use]
    pub fn sorted_keys(&self) -> Option<&[String]> {
        self.sorted.as_deref()
    }

    /// Split ratio stored under `key`.
    #[must_use]
    pub fn ratio(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            CacheValue::Ratio(r) => Some(*r),
            CacheValue::Calendar(_) | CacheValue::Handle(_) | CacheValue::Text(_) => None,
        }
    }

    /// Calendar numbers stored under `key`.
    #[must_use]
    pub fn calendar(&self, key: &str) -> Option<CalendarInfo> {
        match self.get(key)? {
            CacheValue::Calendar(info) => Some(*info),
            CacheValue::Ratio(_) | CacheValue::Handle(_) | CacheValue::Text(_) => None,
        }
    }

    /// Handle stored under `key`.
    #[must_use]
    pub fn handle(&self, key: &str) -> Option<usize> {
        match self.get(key)? {
            CacheValue::Handle(h) => Some(*h),
            CacheValue::Ratio(_) | CacheValue::Calendar(_) | CacheValue::Text(_) => None,
        }
    }

    /// Text stored under `key`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            CacheValue::Text(t) => Some(t.as_str()),
            CacheValue::Ratio(_) | CacheValue::Calendar(_) | CacheValue::Handle(_) => None,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Declared capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    fn find(&self, key: &str) -> Option<usize> {
        if key.len() > MAX_KEY_LEN {
            return None;
        }
        let size = self.slots.len();
        for attempt in 0..size {
            let index = probe_index(key, size, attempt);
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied { key: k, .. } if k == key => return Some(index),
                Slot::Occupied { .. } | Slot::Tombstone => {}
            }
        }
        None
    }
}

fn check_key(key: &str) -> Result<(), CacheError> {
    if key.len() > MAX_KEY_LEN {
        return Err(CacheError::KeyTooLong {
            key: key.to_string(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}

/// Polynomial string hash evaluated with Horner's rule modulo `m`.
fn string_hash(key: &str, base: u64, m: u64) -> u64 {
    key.bytes()
        .fold(0u64, |hash, b| (hash * base + u64::from(b)) % m)
}

/// Slot visited on the `attempt`-th probe for `key`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn probe_index(key: &str, size: usize, attempt: usize) -> usize {
    let m = size as u64;
    let h1 = string_hash(key, HASH_BASE_1, m);
    let mut h2 = string_hash(key, HASH_BASE_2, m);
    if h2 % m == 0 {
        h2 = 1;
    }
    ((h1 + (attempt as u64 % m) * h2) % m) as usize
}

fn is_prime(x: usize) -> bool {
    if x < 2 {
        return false;
    }
    if x < 4 {
        return true;
    }
    if x % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= x {
        if x % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest prime `>= x`.
#[must_use]
pub fn next_prime(mut x: usize) -> usize {
    while !is_prime(x) {
        x += 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(2), 2);
        assert_eq!(next_prime(8), 11);
        assert_eq!(next_prime(40_000), 40_009);
    }

    #[test]
    fn test_size_is_prime_above_double_capacity() {
        let cache = AssocCache::new(10).unwrap();
        assert_eq!(cache.slots(), 23);
        assert_eq!(cache.capacity(), 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_get_replace() {
        let mut cache = AssocCache::new(4).unwrap();
        assert_eq!(cache.insert("2020-08-31", CacheValue::Ratio(0.25)).unwrap(), None);
        assert_eq!(cache.ratio("2020-08-31"), Some(0.25));
        let old = cache.insert("2020-08-31", CacheValue::Ratio(0.5)).unwrap();
        assert_eq!(old, Some(CacheValue::Ratio(0.25)));
        assert_eq!(cache.ratio("2020-08-31"), Some(0.5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_typed_accessors_reject_other_variants() {
        let mut cache = AssocCache::new(4).unwrap();
        cache.insert("h", CacheValue::Handle(7)).unwrap();
        cache.insert("t", CacheValue::Text("AAPL".into())).unwrap();
        assert_eq!(cache.handle("h"), Some(7));
        assert_eq!(cache.ratio("h"), None);
        assert_eq!(cache.text("t"), Some("AAPL"));
        assert_eq!(cache.calendar("t"), None);
    }

    #[test]
    fn test_capacity_is_a_hard_limit() {
        let mut cache = AssocCache::new(2).unwrap();
        cache.insert("a", CacheValue::Handle(1)).unwrap();
        cache.insert("b", CacheValue::Handle(2)).unwrap();
        let err = cache.insert("c", CacheValue::Handle(3)).unwrap_err();
        assert!(matches!(err, CacheError::CapacityExceeded { capacity: 2 }));
        // replacing an existing key is still allowed at capacity
        cache.insert("b", CacheValue::Handle(5)).unwrap();
        assert_eq!(cache.handle("b"), Some(5));
    }

    #[test]
    fn test_key_too_long() {
        let mut cache = AssocCache::new(2).unwrap();
        let err = cache
            .insert("2020-08-31 09:30:00", CacheValue::Ratio(1.0))
            .unwrap_err();
        assert!(matches!(err, CacheError::KeyTooLong { max: 16, .. }));
        assert!(cache.get("2020-08-31 09:30:00").is_none());
    }

    #[test]
    fn test_remove_keeps_probe_chain() {
        let mut cache = AssocCache::new(8).unwrap();
        let keys: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
        for (i, k) in keys.iter().enumerate() {
            cache.insert(k, CacheValue::Handle(i)).unwrap();
        }
        assert_eq!(cache.remove("k3"), Some(CacheValue::Handle(3)));
        assert!(!cache.contains("k3"));
        for (i, k) in keys.iter().enumerate().filter(|(i, _)| *i != 3) {
            assert_eq!(cache.handle(k), Some(i));
        }
        cache.insert("k9", CacheValue::Handle(9)).unwrap();
        assert_eq!(cache.handle("k9"), Some(9));
    }

    #[test]
    fn test_ordinal_index() {
        let entries = ["2020-01-02", "2020-01-03", "2020-01-06"]
            .iter()
            .enumerate()
            .map(|(i, k)| ((*k).to_string(), CacheValue::Handle(i)))
            .collect();
        let cache = AssocCache::with_sorted(entries).unwrap();
        assert_eq!(cache.ordinal_index("2020-01-01"), None);
        assert_eq!(cache.ordinal_index("2020-01-02"), Some(0));
        assert_eq!(cache.ordinal_index("2020-01-04"), Some(1));
        assert_eq!(cache.ordinal_index("2020-01-06"), Some(2));
        assert_eq!(cache.ordinal_index("2021-01-01"), Some(2));
    }

    #[test]
    fn test_ordinal_index_requires_sorted_variant() {
        let mut cache = AssocCache::new(2).unwrap();
        cache.insert("a", CacheValue::Handle(0)).unwrap();
        assert_eq!(cache.ordinal_index("a"), None);
    }

    #[test]
    fn test_with_sorted_rejects_unsorted() {
        let entries = vec![
            ("b".to_string(), CacheValue::Handle(0)),
            ("a".to_string(), CacheValue::Handle(1)),
        ];
        let err = AssocCache::with_sorted(entries).unwrap_err();
        assert!(matches!(err, CacheError::UnsortedKeys { .. }));
    }

    #[test]
    fn test_packed_calendar_info() {
        let info = CalendarInfo::from_packed((7 << 16) | 10);
        assert_eq!(info.day_number, 10);
        assert_eq!(info.busday_number, 7);
        assert!(info.is_busday);
        let holiday = CalendarInfo::from_packed(-((7 << 16) | 12));
        assert_eq!(holiday.day_number, 12);
        assert_eq!(holiday.busday_number, 7);
        assert!(!holiday.is_busday);
        assert_eq!(holiday.packed(), -((7 << 16) | 12));
    }
}

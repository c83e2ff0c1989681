use touchline_shared::models::GameType;

/// Maximum number of pre-rendered backgrounds kept alive. Each entry is a
/// full offscreen surface, so the bound matters on memory-constrained
/// mobile browsers.
pub const BACKGROUND_CACHE_CAPACITY: usize = 10;

/// Everything the background render depends on. Two boards that share a
/// key share pixels; anything else must not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundKey {
    /// Backing-store width in device pixels.
    pub width: u32,
    /// Backing-store height in device pixels.
    pub height: u32,
    pub tactics_view: bool,
    pub game_type: GameType,
}

/// Capacity-bounded least-recently-used cache. Generic over the value so
/// the eviction logic is testable without a browser surface; the renderer
/// instantiates it with `HtmlCanvasElement`.
///
/// Entries are kept in recency order, least recent first. Lookups move
/// the entry to the back; inserting past capacity drops the front.
pub struct RenderCache<V> {
    capacity: usize,
    entries: Vec<(BackgroundKey, V)>,
}

impl<V> RenderCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key, refreshing its recency on hit.
    pub fn get(&mut self, key: &BackgroundKey) -> Option<&V> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(idx);
        self.entries.push(entry);
        self.entries.last().map(|(_, v)| v)
    }

    /// Insert a value, evicting the least-recently-used entry when full.
    /// Re-inserting an existing key replaces its value and refreshes it.
    pub fn insert(&mut self, key: BackgroundKey, value: V) {
        if let Some(idx) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(idx);
        } else if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push((key, value));
    }

    /// Drop every entry. Used on visibility-resume, where cached surfaces
    /// may reference invalidated rendering state.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(w: u32) -> BackgroundKey {
        BackgroundKey {
            width: w,
            height: 600,
            tactics_view: false,
            game_type: GameType::Soccer,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        cache.insert(key(800), 1);
        assert_eq!(cache.get(&key(800)), Some(&1));
        assert_eq!(cache.get(&key(801)), None);
    }

    #[test]
    fn test_capacity_bound_evicts_lru() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        for w in 0..10 {
            cache.insert(key(w), w);
        }
        assert_eq!(cache.len(), 10);
        // 11th distinct key evicts exactly the least-recently-touched (w=0)
        cache.insert(key(10), 10);
        assert_eq!(cache.len(), 10);
        assert_eq!(cache.get(&key(0)), None);
        assert_eq!(cache.get(&key(1)), Some(&1));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        for w in 0..10 {
            cache.insert(key(w), w);
        }
        // Touch the oldest entry; the next eviction must take w=1 instead.
        assert!(cache.get(&key(0)).is_some());
        cache.insert(key(10), 10);
        assert_eq!(cache.get(&key(0)), Some(&0));
        assert_eq!(cache.get(&key(1)), None);
    }

    #[test]
    fn test_mode_is_part_of_the_key() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        let normal = BackgroundKey {
            width: 800,
            height: 600,
            tactics_view: false,
            game_type: GameType::Soccer,
        };
        let tactics = BackgroundKey {
            tactics_view: true,
            ..normal
        };
        cache.insert(normal, 1);
        cache.insert(tactics, 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&normal), Some(&1));
        assert_eq!(cache.get(&tactics), Some(&2));
    }

    #[test]
    fn test_reinsert_replaces_without_growth() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        cache.insert(key(800), 1);
        cache.insert(key(800), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key(800)), Some(&2));
    }

    #[test]
    fn test_clear() {
        let mut cache: RenderCache<u32> = RenderCache::new(10);
        cache.insert(key(800), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key(800)), None);
    }
}

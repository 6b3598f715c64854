use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};

use super::store::RawRow;
use super::table::Scope;

/// Identifies one cached list view: a table as seen from one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub table: &'static str,
    pub scope: Scope,
}

impl ViewKey {
    pub fn new(table: &'static str, scope: Scope) -> Self {
        Self { table, scope }
    }
}

/// Broadcast after every successful mutation so consumers refetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub table: &'static str,
    pub scope: Scope,
}

#[derive(Debug)]
struct Entry {
    /// Clock value of the last invalidation of this view
    generation: u64,
    rows: Option<(Instant, Vec<RawRow>)>,
}

#[derive(Debug, Default)]
struct Views {
    entries: HashMap<ViewKey, Entry>,
    /// Bumped by every invalidation
    clock: u64,
    /// Highest generation among evicted entries
    floor: u64,
}

pub enum Lookup {
    Hit(Vec<RawRow>),
    /// Fetch from the store, then `store` with this generation
    Miss { generation: u64 },
}

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Cached list views, invalidated explicitly after each mutation.
///
/// A lookup that misses hands out the current invalidation clock. A fetch that
/// started before a later invalidation of the same view is dropped instead of
/// stored, so a racing read cannot resurrect a stale list.
///
/// Views also expire after `max_age`, which bounds how long a write made by
/// another process can go unseen, and at most `max_entries` views are kept.
pub struct ViewCache {
    enabled: bool,
    max_age: Duration,
    max_entries: usize,
    views: RwLock<Views>,
    events: broadcast::Sender<Invalidation>,
}

impl ViewCache {
    pub fn new(enabled: bool) -> Self {
        Self::with_limits(enabled, DEFAULT_MAX_AGE, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limits(enabled: bool, max_age: Duration, max_entries: usize) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            enabled: enabled && max_entries > 0,
            max_age,
            max_entries,
            views: RwLock::new(Views::default()),
            events,
        }
    }

    pub async fn lookup(&self, key: &ViewKey) -> Lookup {
        if !self.enabled {
            return Lookup::Miss { generation: 0 };
        }

        let views = self.views.read().await;
        match views.entries.get(key) {
            Some(Entry {
                rows: Some((fetched_at, rows)),
                ..
            }) if fetched_at.elapsed() < self.max_age => Lookup::Hit(rows.clone()),
            _ => Lookup::Miss {
                generation: views.clock,
            },
        }
    }

    /// Store a fetched view; returns false when the view was invalidated
    /// after the fetch began.
    pub async fn store(&self, key: ViewKey, generation: u64, rows: Vec<RawRow>) -> bool {
        if !self.enabled {
            return false;
        }

        let mut views = self.views.write().await;
        let invalidated_at = match views.entries.get(&key) {
            Some(entry) => entry.generation,
            None => views.floor,
        };
        if invalidated_at > generation {
            tracing::debug!(table = key.table, "Dropping list view fetched before invalidation");
            return false;
        }

        views.entries.insert(
            key,
            Entry {
                generation: invalidated_at,
                rows: Some((Instant::now(), rows)),
            },
        );
        self.evict(&mut views);
        true
    }

    /// Mark a view stale and notify subscribers
    pub async fn invalidate(&self, key: ViewKey) {
        if self.enabled {
            let mut views = self.views.write().await;
            views.clock += 1;
            let generation = views.clock;
            views.entries.insert(key, Entry { generation, rows: None });
            self.evict(&mut views);
        }

        // No subscribers is fine
        let _ = self.events.send(Invalidation {
            table: key.table,
            scope: key.scope,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.events.subscribe()
    }

    pub async fn view_count(&self) -> usize {
        self.views.read().await.entries.len()
    }

    /// Drop expired views, then the oldest ones, until within `max_entries`
    fn evict(&self, views: &mut Views) {
        if views.entries.len() <= self.max_entries {
            return;
        }

        let max_age = self.max_age;
        let mut floor = views.floor;
        views.entries.retain(|_, entry| {
            let live = matches!(&entry.rows, Some((fetched_at, _)) if fetched_at.elapsed() < max_age);
            if !live {
                floor = floor.max(entry.generation);
            }
            live
        });

        while views.entries.len() > self.max_entries {
            let oldest = views
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.rows.as_ref().map(|(fetched_at, _)| *fetched_at))
                .map(|(key, _)| *key);
            let Some(key) = oldest else { break };
            if let Some(entry) = views.entries.remove(&key) {
                floor = floor.max(entry.generation);
            }
        }

        views.floor = floor;
    }
}

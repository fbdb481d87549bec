// Bounded, coalescing document cache keyed by URI

use crate::docbuilder::{DocumentBuilder, TaxonomyDocument};
use crate::{Error, Result};
use compact_str::CompactString;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DEFAULT_CACHE_SIZE: usize = 5000;

struct CacheEntry {
    doc: Arc<TaxonomyDocument>,
    last_used: AtomicU64,
}

/// In-flight parse shared between the winner of the insertion race and any
/// waiters; losers block on the condvar until the winner publishes.
struct Flight {
    state: Mutex<Option<std::result::Result<Arc<TaxonomyDocument>, CompactString>>>,
    cond: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            state: Mutex::new(None),
            cond: Condvar::new(),
        }
    }

    fn publish(&self, result: std::result::Result<Arc<TaxonomyDocument>, CompactString>) {
        *self.state.lock() = Some(result);
        self.cond.notify_all();
    }

    fn wait(&self, uri: &str) -> Result<Arc<TaxonomyDocument>> {
        let mut state = self.state.lock();
        loop {
            match state.as_ref() {
                Some(Ok(doc)) => return Ok(doc.clone()),
                Some(Err(cause)) => {
                    return Err(Error::DocumentFetch {
                        uri: uri.to_string(),
                        cause: cause.to_string(),
                    })
                }
                None => self.cond.wait(&mut state),
            }
        }
    }
}

/// LRU wrapper over a [`DocumentBuilder`].
///
/// Concurrent builds of the same URI coalesce to a single parse; failures
/// are never memoized; eviction only drops the cache's own reference, so a
/// document held by a caller stays alive.
pub struct CachingDocumentBuilder<B> {
    inner: B,
    capacity: usize,
    clock: AtomicU64,
    entries: DashMap<CompactString, CacheEntry>,
    in_flight: DashMap<CompactString, Arc<Flight>>,
}

impl<B: DocumentBuilder> CachingDocumentBuilder<B> {
    pub fn new(inner: B) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(inner: B, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            entries: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[inline(always)]
    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup(&self, uri: &str) -> Option<Arc<TaxonomyDocument>> {
        let entry = self.entries.get(uri)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(entry.doc.clone())
    }

    fn store(&self, uri: &str, doc: Arc<TaxonomyDocument>) {
        self.entries.insert(
            CompactString::from(uri),
            CacheEntry {
                doc,
                last_used: AtomicU64::new(self.tick()),
            },
        );
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().last_used.load(Ordering::Relaxed))
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<B: DocumentBuilder> DocumentBuilder for CachingDocumentBuilder<B> {
    fn build(&self, uri: &str) -> Result<Arc<TaxonomyDocument>> {
        if let Some(doc) = self.lookup(uri) {
            return Ok(doc);
        }

        let flight = match self.in_flight.entry(CompactString::from(uri)) {
            Entry::Occupied(occupied) => {
                let flight = occupied.get().clone();
                drop(occupied);
                return flight.wait(uri);
            }
            Entry::Vacant(vacant) => {
                let flight = Arc::new(Flight::new());
                vacant.insert(flight.clone());
                flight
            }
        };

        // Winner of the race. A racer may have completed between the cache
        // miss and the flight insertion.
        if let Some(doc) = self.lookup(uri) {
            flight.publish(Ok(doc.clone()));
            self.in_flight.remove(uri);
            return Ok(doc);
        }

        let result = self.inner.build(uri);
        match &result {
            Ok(doc) => {
                self.store(uri, doc.clone());
                flight.publish(Ok(doc.clone()));
            }
            Err(err) => {
                flight.publish(Err(CompactString::from(err.to_string())));
            }
        }
        self.in_flight.remove(uri);
        result
    }
}

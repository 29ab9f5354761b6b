//! Parse cache for argument-free queries

use crate::config::QueryConfig;
use crate::error::Result;
use crate::expression::Params;
use crate::query::parse_query_with_config;
use crate::tree::FilterTree;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Most cached trees before the cache is emptied
pub const CACHE_CAPACITY: usize = 1024;

/// Parsed trees keyed by the configuration they were parsed with, then by query text
#[derive(Default)]
struct QueryCache {
    entries: AHashMap<QueryConfig, AHashMap<String, FilterTree>>,
    len: usize,
}

impl QueryCache {
    fn get(&self, config: &QueryConfig, query: &str) -> Option<&FilterTree> {
        self.entries.get(config)?.get(query)
    }

    fn insert(&mut self, config: &QueryConfig, query: &str, tree: FilterTree) {
        if self.len >= CACHE_CAPACITY {
            tracing::debug!(capacity = CACHE_CAPACITY, "query cache full, clearing");
            self.clear();
        }
        let previous = self
            .entries
            .entry(config.clone())
            .or_default()
            .insert(query.to_string(), tree);
        if previous.is_none() {
            self.len += 1;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }
}

/// Global query cache with fast hashing (ahash)
static QUERY_CACHE: Lazy<RwLock<QueryCache>> = Lazy::new(|| RwLock::new(QueryCache::default()));

/// Get or parse a query that takes no arguments, with the default configuration
///
/// Queries with placeholders fail to parse here and are never cached.
#[inline]
pub fn get_or_parse(query: &str) -> Result<FilterTree> {
    get_or_parse_with_config(query, &QueryConfig::default())
}

pub fn get_or_parse_with_config(query: &str, config: &QueryConfig) -> Result<FilterTree> {
    {
        let cache = QUERY_CACHE.read();
        if let Some(tree) = cache.get(config, query) {
            return Ok(tree.create_copy());
        }
    }

    tracing::debug!(query, "query cache miss");
    let tree = parse_query_with_config(query, Params::none(), config)?;

    QUERY_CACHE.write().insert(config, query, tree.create_copy());

    Ok(tree)
}

pub fn clear_cache() {
    QUERY_CACHE.write().clear();
}

pub fn cache_size() -> usize {
    QUERY_CACHE.read().len
}

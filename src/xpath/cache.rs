//! Compiled query cache
//!
//! Process-wide LRU of compiled queries keyed by the query string, so a
//! query selected repeatedly (or from several parser clones) compiles once.

use super::compiler::{compile, CompiledQuery};
use crate::error::QueryError;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

const CACHE_CAPACITY: usize = 256;

type QueryCache = LruCache<String, Arc<CompiledQuery>>;

static CACHE: OnceLock<Mutex<QueryCache>> = OnceLock::new();

fn cache() -> MutexGuard<'static, QueryCache> {
    let cache = CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(LruCache::new(capacity))
    });
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Compile `query`, reusing a cached compilation when present
pub fn compile_cached(query: &str) -> Result<Arc<CompiledQuery>, QueryError> {
    if let Some(compiled) = cache().get(query) {
        tracing::trace!("query cache hit: {}", query);
        return Ok(Arc::clone(compiled));
    }

    let compiled = Arc::new(compile(query)?);
    tracing::debug!(
        "compiled query '{}': {} steps, relative={}, descendants={}, floating={}, ascend={}",
        query,
        compiled.steps.len(),
        compiled.relative,
        compiled.include_descendants,
        compiled.floating,
        compiled.ascend_count
    );
    cache().put(query.to_owned(), Arc::clone(&compiled));
    Ok(compiled)
}

/// Drop every cached compilation
pub fn clear_cache() {
    cache().clear();
}

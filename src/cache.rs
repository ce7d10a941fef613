// src/cache.rs
use async_trait::async_trait;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::errors::Result;
use crate::models::CandidateList;
use crate::resolver::CandidateSource;

/// Memoizes a `CandidateSource` for a bounded time.
///
/// The lock is never held while the inner source resolves, so concurrent
/// callers on a cold cache may each resolve once. Only successes are cached.
pub struct CachedResolver<S> {
    inner: S,
    ttl: Duration,
    entry: RwLock<Option<(Instant, CandidateList)>>,
}

impl<S: CandidateSource> CachedResolver<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn fresh(&self) -> Option<CandidateList> {
        let guard = self.entry.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, list)| list.clone())
    }
}

#[async_trait]
impl<S: CandidateSource> CandidateSource for CachedResolver<S> {
    async fn candidates(&self) -> Result<CandidateList> {
        if let Some(list) = self.fresh() {
            log::debug!("Candidate cache hit ({} candidates)", list.len());
            return Ok(list);
        }

        log::debug!("Candidate cache miss, resolving");
        let list = self.inner.candidates().await?;
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some((Instant::now(), list.clone()));
        Ok(list)
    }

    fn invalidate(&self) {
        log::info!("🧹 Dropping cached candidate list");
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.inner.invalidate();
    }
}

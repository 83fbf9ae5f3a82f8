//! Content-addressed extraction memoization.
//!
//! One slot per cache: `(path, fingerprint, result)`. Concurrent calls are
//! serialized against the slot, so the wrapped extractor never runs twice
//! for the same fingerprint; the first completed result is published
//! atomically and returned by shared reference afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ExtractError;
use crate::extract::{Extractor, ExtractorResult};
use crate::fingerprint::compute_fingerprint;

struct CacheSlot<I> {
    path: PathBuf,
    fingerprint: String,
    result: Arc<ExtractorResult<I>>,
}

pub struct ExtractionCache<E: Extractor> {
    extractor: E,
    slot: Mutex<Option<CacheSlot<E::Index>>>,
}

impl<E: Extractor> ExtractionCache<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            slot: Mutex::new(None),
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Extract through the cache. Failure results and propagated errors
    /// leave no state behind; the next call re-invokes the extractor.
    pub async fn extract(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Arc<ExtractorResult<E::Index>>, ExtractError> {
        let mut slot = self.slot.lock().await;

        let fingerprint = compute_fingerprint(path, self.extractor.extensions());
        if let Some(cached) = slot.as_ref() {
            if cached.path == path && cached.fingerprint == fingerprint {
                debug!(path = %path.display(), "extraction cache hit");
                return Ok(cached.result.clone());
            }
        }

        let result = self.extractor.extract(path, cancel).await?;
        if !result.is_success() {
            return Ok(Arc::new(result));
        }

        let shared = Arc::new(result);
        *slot = Some(CacheSlot {
            path: path.to_path_buf(),
            fingerprint,
            result: shared.clone(),
        });
        Ok(shared)
    }

    /// Drop the slot unconditionally.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// True iff a slot exists whose path and *recomputed* fingerprint match.
    pub async fn is_cached(&self, path: &Path) -> bool {
        let slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(cached) if cached.path == path => {
                cached.fingerprint == compute_fingerprint(path, self.extractor.extensions())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::python::ApiIndex;
    use crate::model::Language;

    struct CountingExtractor {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: false,
            }
        }

        fn failing_once() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Extractor for CountingExtractor {
        type Index = ApiIndex;

        fn language(&self) -> Language {
            Language::Python
        }

        async fn extract(
            &self,
            _source: &Path,
            _cancel: &CancellationToken,
        ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // Let concurrent callers pile up on the slot lock.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail_first && call == 0 {
                return Ok(ExtractorResult::failure("transient analyzer failure"));
            }
            Ok(ExtractorResult::success(ApiIndex::new("pkg")))
        }
    }

    fn seed(dir: &Path) {
        std::fs::write(dir.join("a.py"), "class A: pass").unwrap();
    }

    #[tokio::test]
    async fn hit_returns_the_same_reference() {
        let dir = tempfile::TempDir::new().unwrap();
        seed(dir.path());
        let cache = ExtractionCache::new(CountingExtractor::new());
        let cancel = CancellationToken::new();

        let first = cache.extract(dir.path(), &cancel).await.unwrap();
        let second = cache.extract(dir.path(), &cancel).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.extractor().calls(), 1);
        assert!(cache.is_cached(dir.path()).await);
    }

    #[tokio::test]
    async fn source_change_invalidates() {
        let dir = tempfile::TempDir::new().unwrap();
        seed(dir.path());
        let cache = ExtractionCache::new(CountingExtractor::new());
        let cancel = CancellationToken::new();

        cache.extract(dir.path(), &cancel).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        std::fs::write(dir.path().join("a.py"), "class A:\n    x = 1").unwrap();
        assert!(!cache.is_cached(dir.path()).await);

        cache.extract(dir.path(), &cancel).await.unwrap();
        assert_eq!(cache.extractor().calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_then_extract_is_a_fresh_first_call() {
        let dir = tempfile::TempDir::new().unwrap();
        seed(dir.path());
        let cache = ExtractionCache::new(CountingExtractor::new());
        let cancel = CancellationToken::new();

        cache.extract(dir.path(), &cancel).await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_cached(dir.path()).await);
        cache.extract(dir.path(), &cancel).await.unwrap();
        assert_eq!(cache.extractor().calls(), 2);
    }

    #[tokio::test]
    async fn failure_results_are_not_cached() {
        let dir = tempfile::TempDir::new().unwrap();
        seed(dir.path());
        let cache = ExtractionCache::new(CountingExtractor::failing_once());
        let cancel = CancellationToken::new();

        let first = cache.extract(dir.path(), &cancel).await.unwrap();
        assert!(!first.is_success());
        assert!(!cache.is_cached(dir.path()).await);

        let second = cache.extract(dir.path(), &cancel).await.unwrap();
        assert!(second.is_success());
        assert_eq!(cache.extractor().calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_extractions_run_the_extractor_once() {
        let dir = tempfile::TempDir::new().unwrap();
        seed(dir.path());
        let cache = Arc::new(ExtractionCache::new(CountingExtractor::new()));
        let path = dir.path().to_path_buf();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                cache.extract(&path, &cancel).await.unwrap()
            }));
        }
        let results: Vec<_> = futures_join_all(handles).await;
        assert_eq!(cache.extractor().calls(), 1);
        let first = &results[0];
        assert!(results.iter().all(|r| Arc::ptr_eq(first, r)));
    }

    async fn futures_join_all(
        handles: Vec<tokio::task::JoinHandle<Arc<ExtractorResult<ApiIndex>>>>,
    ) -> Vec<Arc<ExtractorResult<ApiIndex>>> {
        let mut out = Vec::new();
        for handle in handles {
            out.push(handle.await.unwrap());
        }
        out
    }
}

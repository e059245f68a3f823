//! Batch translation coordination: cache-first segment translation with
//! bounded batches, per-batch retries, and order-preserving reassembly.

pub mod api_client;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::services::cache::LruStore;
use crate::services::fingerprint::segment_fingerprint;
use crate::services::translation::api_client::Translator;
use crate::services::CapabilityError;

/// Coordinates segment translation against the segment cache and the
/// translation capability.
///
/// For any segment whose fingerprint is already cached, zero provider calls
/// are made; repeated segments within a run collapse to one slot, so N
/// distinct misses with batch size K cost at most ceil(N/K) calls.
pub struct BatchTranslator {
    client: Arc<dyn Translator>,
    cache: Arc<LruStore<String>>,
    batch_size: usize,
    max_retries: u32,
    backoff: Duration,
    call_timeout: Duration,
}

impl BatchTranslator {
    pub fn new(
        client: Arc<dyn Translator>,
        cache: Arc<LruStore<String>>,
        batch_size: usize,
        max_retries: u32,
        backoff: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            batch_size: batch_size.max(1),
            max_retries: max_retries.max(1),
            backoff,
            call_timeout,
        }
    }

    /// Translate `texts` into `target_language`, preserving input order.
    ///
    /// Blank segments pass through untranslated. A batch that still fails
    /// after retries does not abort the other batches, but any unresolved
    /// segment fails the whole operation: partially translated subtitle
    /// tracks are never silently produced.
    pub async fn translate_segments(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CapabilityError> {
        let mut results: Vec<Option<String>> = vec![None; texts.len()];
        // One entry per distinct fingerprint: (fingerprint, trimmed text,
        // every input index carrying it). Repeated segments translate once
        // and fan back out to all of their positions.
        let mut pending: Vec<(String, String, Vec<usize>)> = Vec::new();
        let mut pending_index: HashMap<String, usize> = HashMap::new();

        for (i, text) in texts.iter().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                results[i] = Some(text.clone());
                continue;
            }
            let key = segment_fingerprint(trimmed, target_language);
            if let Some(&slot) = pending_index.get(&key) {
                pending[slot].2.push(i);
                continue;
            }
            match self.cache.get(&key) {
                Some(hit) => results[i] = Some(hit),
                None => {
                    pending_index.insert(key.clone(), pending.len());
                    pending.push((key, trimmed.to_string(), vec![i]));
                }
            }
        }

        if pending.is_empty() {
            return Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect());
        }

        tracing::debug!(
            total = texts.len(),
            distinct_pending = pending.len(),
            "Translating uncached segments"
        );

        let mut unresolved = 0usize;
        let mut last_error: Option<CapabilityError> = None;

        for batch in pending.chunks(self.batch_size) {
            let batch_texts: Vec<String> = batch.iter().map(|(_, t, _)| t.clone()).collect();
            match self.call_with_retries(&batch_texts, target_language).await {
                Ok(translated) => {
                    for ((key, _, indices), text) in batch.iter().zip(translated) {
                        self.cache.put(key.clone(), text.clone());
                        for &index in indices {
                            results[index] = Some(text.clone());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        segments = batch.iter().map(|(_, _, idx)| idx.len()).sum::<usize>(),
                        error = %e,
                        "Translation batch unresolved after retries"
                    );
                    unresolved += batch.iter().map(|(_, _, idx)| idx.len()).sum::<usize>();
                    last_error = Some(e);
                }
            }
        }

        if unresolved > 0 {
            let detail = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown provider error".to_string());
            return Err(CapabilityError::Failed(format!(
                "translation failed for {unresolved} of {} segments after {} attempts per batch: {detail}",
                texts.len(),
                self.max_retries
            )));
        }

        Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    /// One batch against the provider, bounded per call and retried with
    /// linear backoff on transient failures only.
    async fn call_with_retries(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CapabilityError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let call = self.client.translate_batch(texts, target_language);
            let outcome = match timeout(self.call_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(CapabilityError::Timeout(self.call_timeout)),
            };

            match outcome {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let wait = self.backoff * attempt;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        backoff_ms = wait.as_millis() as u64,
                        error = %e,
                        "Translation batch failed, retrying"
                    );
                    sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Uppercases everything, counting calls; optionally fails the first
    /// `fail_first` calls.
    struct FakeTranslator {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl FakeTranslator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: 0,
            }
        }

        fn failing_first(n: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: n,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate_batch(
            &self,
            texts: &[String],
            _target_language: &str,
        ) -> Result<Vec<String>, CapabilityError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(CapabilityError::Failed("provider hiccup".to_string()));
            }
            Ok(texts.iter().map(|t| t.to_uppercase()).collect())
        }
    }

    fn coordinator(
        client: Arc<FakeTranslator>,
        cache: Arc<LruStore<String>>,
        batch_size: usize,
        max_retries: u32,
    ) -> BatchTranslator {
        BatchTranslator::new(
            client,
            cache,
            batch_size,
            max_retries,
            Duration::ZERO,
            Duration::from_secs(5),
        )
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("segment {i}")).collect()
    }

    #[tokio::test]
    async fn fresh_segments_cost_ceil_n_over_k_calls() {
        let client = Arc::new(FakeTranslator::new());
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 4, 3);

        let input = texts(10);
        let out = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), 3, "ceil(10/4)");
        assert_eq!(out.len(), 10);
        for (i, t) in out.iter().enumerate() {
            assert_eq!(t, &format!("SEGMENT {i}"), "order preserved");
        }
    }

    #[tokio::test]
    async fn fully_cached_input_makes_zero_calls() {
        let client = Arc::new(FakeTranslator::new());
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), Arc::clone(&cache), 4, 3);

        let input = texts(6);
        let first = batcher.translate_segments(&input, "id").await.unwrap();
        let calls_after_first = client.calls();

        let second = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), calls_after_first, "second run fully cached");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn duplicates_collapse_to_one_translation_within_a_run() {
        let client = Arc::new(FakeTranslator::new());
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 10, 3);

        // 50 segments over 10 distinct values: repeats collapse before
        // batching, so the 10 distinct texts fit a single provider call
        // instead of the ceil(50/10) = 5 a naive split would cost.
        let input: Vec<String> = (0..50).map(|i| format!("line {}", i % 10)).collect();
        let out = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), 1, "10 distinct texts, batch size 10");
        assert!(client.calls() < 5, "strictly fewer than segments/batch_size");
        assert_eq!(out[0], "LINE 0");
        assert_eq!(out[49], "LINE 9");

        // Identical rerun requires no provider calls at all.
        let calls = client.calls();
        batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), calls);
    }

    #[tokio::test]
    async fn duplicate_fan_out_preserves_positions_across_batches() {
        let client = Arc::new(FakeTranslator::new());
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 2, 3);

        // Repeats interleaved with distinct texts; the distinct set spans
        // multiple batches of 2.
        let input: Vec<String> = ["alpha", "beta", "alpha", "gamma", "beta", "delta"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = batcher.translate_segments(&input, "id").await.unwrap();

        assert_eq!(client.calls(), 2, "4 distinct texts, batch size 2");
        assert_eq!(
            out,
            vec!["ALPHA", "BETA", "ALPHA", "GAMMA", "BETA", "DELTA"]
        );
    }

    #[tokio::test]
    async fn blank_segments_pass_through_without_calls() {
        let client = Arc::new(FakeTranslator::new());
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 4, 3);

        let input = vec!["".to_string(), "  ".to_string()];
        let out = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), 0);
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_then_succeed() {
        let client = Arc::new(FakeTranslator::failing_first(2));
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 10, 3);

        let input = texts(3);
        let out = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), 3, "two failures, one success");
        assert_eq!(out[2], "SEGMENT 2");
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_operation() {
        let client = Arc::new(FakeTranslator::failing_first(100));
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), cache, 2, 3);

        let input = texts(4);
        let err = batcher.translate_segments(&input, "id").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Failed(_)));
        // Both batches got their full retry budget.
        assert_eq!(client.calls(), 6);
    }

    #[tokio::test]
    async fn one_failed_batch_does_not_discard_the_others_cache_writes() {
        // Fails exactly the first call; the first batch burns through its
        // budget only if every attempt fails, so fail_first=3 kills batch one
        // while batch two succeeds and is cached.
        let client = Arc::new(FakeTranslator::failing_first(3));
        let cache = Arc::new(LruStore::new("segment", 100));
        let batcher = coordinator(Arc::clone(&client), Arc::clone(&cache), 2, 3);

        let input = texts(4);
        assert!(batcher.translate_segments(&input, "id").await.is_err());

        // Segments of the surviving batch were cached, so a retry of the full
        // input only re-translates the failed batch.
        let calls = client.calls();
        let out = batcher.translate_segments(&input, "id").await.unwrap();
        assert_eq!(client.calls(), calls + 1);
        assert_eq!(out[0], "SEGMENT 0");
    }
}

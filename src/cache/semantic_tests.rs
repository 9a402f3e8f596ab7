use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::embedding::mock::{axis, vector_with_similarity};
use crate::embedding::{EmbeddingProvider, MockEmbedder};
use crate::hashing::{dynamic_cache_key, pre_cache_key};
use crate::ingest::{DocumentPage, QaPair};
use crate::vectordb::MockVectorDbClient;

const DIM: usize = 8;

async fn open_cache(
    embedder: Arc<MockEmbedder>,
    config: SemanticCacheConfig,
) -> SemanticCache<MockVectorDbClient> {
    SemanticCache::open(
        MockVectorDbClient::new(),
        embedder as Arc<dyn EmbeddingProvider>,
        config,
    )
    .await
    .expect("cache should open")
}

async fn default_cache() -> (Arc<MockEmbedder>, SemanticCache<MockVectorDbClient>) {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let cache = open_cache(Arc::clone(&embedder), SemanticCacheConfig::default()).await;
    (embedder, cache)
}

mod open_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_detects_dimension() {
        let (_, cache) = default_cache().await;
        assert_eq!(cache.index().dimension(), DIM);
        assert_eq!(cache.window().capacity(), 5);
        assert!(cache.is_ready().await);
    }

    #[tokio::test]
    async fn test_open_fails_when_sample_embed_fails() {
        let embedder = Arc::new(MockEmbedder::new(DIM));
        embedder.set_failing(true);

        let result = SemanticCache::open(
            MockVectorDbClient::new(),
            embedder as Arc<dyn EmbeddingProvider>,
            SemanticCacheConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(CacheError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let result = SemanticCache::open(
            MockVectorDbClient::new(),
            embedder as Arc<dyn EmbeddingProvider>,
            SemanticCacheConfig::default().threshold(1.5),
        )
        .await;

        assert!(matches!(result, Err(CacheError::Config { .. })));
    }

    #[test]
    fn test_config_validation() {
        assert!(SemanticCacheConfig::default().validate().is_ok());
        assert!(SemanticCacheConfig::default().top_k(0).validate().is_err());
        assert!(
            SemanticCacheConfig::default()
                .dynamic_cache_size(0)
                .validate()
                .is_err()
        );
        assert!(SemanticCacheConfig::default().collection(" ").validate().is_err());
        assert!(
            SemanticCacheConfig::default()
                .embed_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_default_threshold() {
        assert!((SemanticCacheConfig::default().threshold - 0.70).abs() < f32::EPSILON);
    }
}

mod check_tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_returns_exact_text() {
        let (embedder, cache) = default_cache().await;
        embedder.pin("관세 환급 절차", axis(DIM));
        embedder.pin("관세 환급은 어떻게 하나요", vector_with_similarity(DIM, 0.9));

        cache
            .pre_cache(
                &[QaPair::new("관세 환급 절차", "환급 신청서를 제출합니다.")],
                "guide.pdf",
            )
            .await
            .unwrap();

        let lookup = cache.check("관세 환급은 어떻게 하나요").await;
        match lookup {
            CacheLookup::Hit(hit) => {
                assert_eq!(hit.text, "환급 신청서를 제출합니다.");
                assert_eq!(hit.key, pre_cache_key("guide.pdf", 0));
                assert_eq!(hit.origin, Some(CacheOrigin::PreCached));
                assert!((hit.similarity - 0.9).abs() < 1e-4);
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_below_threshold_is_miss() {
        let (embedder, cache) = default_cache().await;
        embedder.pin("stored", axis(DIM));
        embedder.pin("query", vector_with_similarity(DIM, 0.5));
        cache.save_dynamic("stored", "answer").await.unwrap();

        assert!(matches!(
            cache.check("query").await,
            CacheLookup::Miss(MissReason::BelowThreshold { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_with_overrides_threshold() {
        let (embedder, cache) = default_cache().await;
        embedder.pin("stored", axis(DIM));
        embedder.pin("query", vector_with_similarity(DIM, 0.8));
        cache.save_dynamic("stored", "answer").await.unwrap();

        assert!(cache.check_with("query", 3, 0.7).await.is_hit());
        assert!(!cache.check_with("query", 3, 0.85).await.is_hit());
    }

    #[tokio::test]
    async fn test_empty_index_is_miss() {
        let (_, cache) = default_cache().await;
        assert_eq!(
            cache.check("anything").await,
            CacheLookup::Miss(MissReason::Empty)
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_is_miss() {
        let (embedder, cache) = default_cache().await;
        embedder.set_failing(true);
        assert_eq!(
            cache.check("anything").await,
            CacheLookup::Miss(MissReason::EmbeddingFailed)
        );
    }

    #[tokio::test]
    async fn test_embedding_timeout_is_miss() {
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let cache = open_cache(
            Arc::clone(&embedder),
            SemanticCacheConfig::default().embed_timeout(Duration::from_millis(20)),
        )
        .await;
        embedder.set_delay(Some(Duration::from_millis(200)));

        assert_eq!(
            cache.check("slow").await,
            CacheLookup::Miss(MissReason::EmbeddingFailed)
        );
        assert!(matches!(
            cache.embed("slow").await,
            Err(crate::embedding::EmbeddingError::Timeout { millis: 20 })
        ));
    }

    #[tokio::test]
    async fn test_index_unavailable_is_miss() {
        let (_, cache) = default_cache().await;
        cache.index().backend().set_available(false);
        assert_eq!(
            cache.check("anything").await,
            CacheLookup::Miss(MissReason::IndexUnavailable)
        );
        assert!(!cache.is_ready().await);
    }
}

mod dynamic_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_dynamic_uses_query_key() {
        let (_, cache) = default_cache().await;
        let key = cache.save_dynamic("질문", "답").await.unwrap();

        assert_eq!(key, dynamic_cache_key("질문"));
        assert_eq!(cache.window().keys().await, vec![key]);
        assert!(cache.check_with("질문", 1, 0.99).await.is_hit());
    }

    #[tokio::test]
    async fn test_same_question_overwrites() {
        let (_, cache) = default_cache().await;
        cache.save_dynamic("질문", "old").await.unwrap();
        cache.save_dynamic("질문", "new").await.unwrap();

        assert_eq!(cache.window().len().await, 1);
        assert_eq!(cache.index().len().await.unwrap(), 1);
        assert_eq!(cache.check("질문").await.text(), Some("new"));
    }

    #[tokio::test]
    async fn test_window_bounds_dynamic_entries_only() {
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let cache = open_cache(
            Arc::clone(&embedder),
            SemanticCacheConfig::default().dynamic_cache_size(2),
        )
        .await;

        cache
            .pre_cache(&[QaPair::new("문서 질문?", "문서 답")], "doc")
            .await
            .unwrap();
        for i in 0..4 {
            cache
                .save_dynamic(&format!("q{i}"), &format!("a{i}"))
                .await
                .unwrap();
        }

        assert_eq!(cache.index().len().await.unwrap(), 3);
        assert_eq!(
            cache.window().keys().await,
            vec![dynamic_cache_key("q2"), dynamic_cache_key("q3")]
        );
        assert!(!cache.check_with("q0", 1, 0.99).await.is_hit());
        assert!(cache.check_with("문서 질문?", 1, 0.99).await.is_hit());
    }

    #[tokio::test]
    async fn test_save_dynamic_fails_when_embedding_fails() {
        let (embedder, cache) = default_cache().await;
        embedder.set_failing(true);

        assert!(matches!(
            cache.save_dynamic("q", "a").await,
            Err(CacheError::Embedding(_))
        ));
        assert!(cache.window().is_empty().await);
    }
}

mod reopen_tests {
    use super::*;

    async fn open_shared(
        backend: &Arc<MockVectorDbClient>,
        embedder: &Arc<MockEmbedder>,
        dynamic_cache_size: usize,
    ) -> SemanticCache<Arc<MockVectorDbClient>> {
        SemanticCache::open(
            Arc::clone(backend),
            Arc::clone(embedder) as Arc<dyn EmbeddingProvider>,
            SemanticCacheConfig::default().dynamic_cache_size(dynamic_cache_size),
        )
        .await
        .expect("cache should open")
    }

    fn dynamic_keys_in(backend: &MockVectorDbClient) -> Vec<String> {
        backend
            .keys("cache_index")
            .into_iter()
            .filter(|k| k.starts_with("cache:dyn:"))
            .collect()
    }

    #[tokio::test]
    async fn test_reopen_keeps_dynamic_entries_bounded() {
        let backend = Arc::new(MockVectorDbClient::new());
        let embedder = Arc::new(MockEmbedder::new(DIM));

        let first = open_shared(&backend, &embedder, 2).await;
        first
            .pre_cache(&[QaPair::new("문서 질문?", "문서 답")], "doc")
            .await
            .unwrap();
        for i in 0..3 {
            first.save_dynamic(&format!("run0 q{i}"), "a").await.unwrap();
        }
        drop(first);

        let second = open_shared(&backend, &embedder, 2).await;
        let mut restored = second.window().keys().await;
        restored.sort();
        let mut expected = vec![dynamic_cache_key("run0 q1"), dynamic_cache_key("run0 q2")];
        expected.sort();
        assert_eq!(restored, expected);

        for i in 0..3 {
            second.save_dynamic(&format!("run1 q{i}"), "b").await.unwrap();
        }

        let mut resident = dynamic_keys_in(&backend);
        resident.sort();
        let mut expected = vec![dynamic_cache_key("run1 q1"), dynamic_cache_key("run1 q2")];
        expected.sort();
        assert_eq!(resident, expected);
        assert_eq!(second.index().len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reopen_with_smaller_window_evicts_oldest() {
        let backend = Arc::new(MockVectorDbClient::new());
        let embedder = Arc::new(MockEmbedder::new(DIM));

        let first = open_shared(&backend, &embedder, 5).await;
        for i in 0..4 {
            first.save_dynamic(&format!("q{i}"), "a").await.unwrap();
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
        drop(first);

        let second = open_shared(&backend, &embedder, 2).await;

        assert_eq!(
            second.window().keys().await,
            vec![dynamic_cache_key("q2"), dynamic_cache_key("q3")]
        );
        assert_eq!(dynamic_keys_in(&backend).len(), 2);
    }

    #[tokio::test]
    async fn test_force_recreate_starts_with_empty_window() {
        let backend = Arc::new(MockVectorDbClient::new());
        let embedder = Arc::new(MockEmbedder::new(DIM));
        let first = open_shared(&backend, &embedder, 2).await;
        first.save_dynamic("q", "a").await.unwrap();
        drop(first);

        let second = SemanticCache::open(
            Arc::clone(&backend),
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            SemanticCacheConfig::default().force_recreate(true),
        )
        .await
        .unwrap();

        assert!(second.window().is_empty().await);
        assert!(second.index().is_empty().await.unwrap());
    }
}

mod pre_cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_pre_cache_pages() {
        let (_, cache) = default_cache().await;
        let pages = vec![DocumentPage::new(
            "질문입니까?\n답변1\n답변2\n또 질문인가요?\n답변3",
        )];

        let stored = cache.pre_cache_pages(&pages, "faq").await.unwrap();

        assert_eq!(stored, 2);
        assert_eq!(cache.index().len().await.unwrap(), 2);
        assert!(cache.window().is_empty().await);
        assert_eq!(
            cache.check_with("질문입니까?", 1, 0.99).await.text(),
            Some("답변1\n답변2")
        );
    }

    #[tokio::test]
    async fn test_pre_cache_sources_do_not_collide() {
        let (_, cache) = default_cache().await;
        cache
            .pre_cache(&[QaPair::new("a?", "1")], "first.pdf")
            .await
            .unwrap();
        cache
            .pre_cache(&[QaPair::new("b?", "2")], "second.pdf")
            .await
            .unwrap();

        assert_eq!(cache.index().len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_pre_cache_empty_is_noop() {
        let (_, cache) = default_cache().await;
        assert_eq!(cache.pre_cache(&[], "none").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pre_cache_aborts_on_embedding_failure() {
        let (embedder, cache) = default_cache().await;
        embedder.set_failing(true);

        let result = cache.pre_cache(&[QaPair::new("q?", "a")], "doc").await;
        assert!(matches!(result, Err(CacheError::Embedding(_))));
        embedder.set_failing(false);
        assert!(cache.index().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_pre_cache_file() {
        let (_, cache) = default_cache().await;
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "머리말\n통관 절차\n수입신고서를 제출합니다.").unwrap();

        assert_eq!(cache.pre_cache_file(file.path()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pre_cache_missing_file() {
        let (_, cache) = default_cache().await;
        let result = cache
            .pre_cache_file(std::path::Path::new("/nonexistent/guide.pdf"))
            .await;
        assert!(matches!(result, Err(CacheError::Ingest(_))));
    }
}

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::cache::{SemanticCache, SemanticCacheConfig};
use crate::embedding::mock::{axis, vector_with_similarity};
use crate::embedding::{EmbeddingProvider, MockEmbedder};
use crate::generation::{GenerationError, Generator, MockGenerator};
use crate::hashing::dynamic_cache_key;
use crate::ingest::QaPair;
use crate::retrieval::{MockRetriever, Passage, RetrievalFallback};
use crate::vectordb::MockVectorDbClient;

const DIM: usize = 8;

fn basis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

struct Harness {
    embedder: Arc<MockEmbedder>,
    retriever: Arc<MockRetriever>,
    generator: Arc<MockGenerator>,
    chain: CacheChain<MockVectorDbClient>,
}

async fn harness_with(config: ChainConfig, cache_config: SemanticCacheConfig) -> Harness {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let cache = SemanticCache::open(
        MockVectorDbClient::new(),
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        cache_config,
    )
    .await
    .expect("cache should open");

    let retriever = Arc::new(MockRetriever::with_passages(vec![
        Passage::new("관세법.pdf", "수입물품에는 관세를 부과한다."),
        Passage::new("고시.pdf", "환급은 수출신고 수리일부터 2년 이내에 신청한다."),
    ]));
    let generator = Arc::new(MockGenerator::new("생성된 답변"));

    let chain = CacheChain::new(
        Arc::new(cache),
        Arc::clone(&retriever) as Arc<dyn RetrievalFallback>,
        Arc::clone(&generator) as Arc<dyn Generator>,
        config,
    )
    .expect("chain should build");

    Harness {
        embedder,
        retriever,
        generator,
        chain,
    }
}

async fn harness() -> Harness {
    harness_with(ChainConfig::default(), SemanticCacheConfig::default()).await
}

mod short_circuit_tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_question_touches_nothing() {
        let h = harness().await;
        let calls_after_open = h.embedder.calls();

        for question in ["", "   ", "\n\t"] {
            let response = h.chain.answer(question).await;
            assert_eq!(response.answer, "질문을 입력해주세요.");
            assert_eq!(response.source, AnswerSource::None);
            assert!(!response.cache_hit);
            assert_eq!(response.outcome, ChainOutcome::EmptyQuestion);
        }

        assert_eq!(h.embedder.calls(), calls_after_open);
        assert_eq!(h.retriever.calls(), 0);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_documents() {
        let h = harness().await;
        h.retriever.set_passages(Vec::new());

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(
            response.answer,
            "죄송합니다. 질문에 대한 관련 문서를 검색할 수 없습니다."
        );
        assert_eq!(response.source, AnswerSource::None);
        assert_eq!(response.outcome, ChainOutcome::NoDocs);
        assert_eq!(h.generator.calls(), 0);
        assert!(h.chain.cache().window().is_empty().await);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_no_documents() {
        let h = harness().await;
        h.retriever.set_failing(true);

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.outcome, ChainOutcome::NoDocs);
        assert_eq!(response.source, AnswerSource::None);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_timeout_is_no_documents() {
        let h = harness_with(
            ChainConfig::default().retrieval_timeout(Duration::from_millis(20)),
            SemanticCacheConfig::default(),
        )
        .await;
        h.retriever.set_delay(Some(Duration::from_millis(300)));

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.outcome, ChainOutcome::NoDocs);
        assert_eq!(h.generator.calls(), 0);
    }
}

mod hit_tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_returns_cached_text_without_fallback() {
        let h = harness().await;
        h.embedder.pin("관세 환급 절차", axis(DIM));
        h.embedder
            .pin("관세 환급은 어떻게 하나요", vector_with_similarity(DIM, 0.9));
        h.chain
            .cache()
            .pre_cache(
                &[QaPair::new("관세 환급 절차", "환급 신청서를 제출합니다.")],
                "guide.pdf",
            )
            .await
            .unwrap();

        let response = h.chain.answer("관세 환급은 어떻게 하나요").await;

        assert_eq!(response.answer, "환급 신청서를 제출합니다.");
        assert_eq!(response.source, AnswerSource::Cag);
        assert!(response.cache_hit);
        assert!(matches!(response.outcome, ChainOutcome::Hit { .. }));
        assert_eq!(h.retriever.calls(), 0);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_similarity_just_below_threshold_falls_back() {
        let h = harness().await;
        h.embedder.pin("stored", axis(DIM));
        h.embedder.pin("query", vector_with_similarity(DIM, 0.84));
        h.chain
            .cache()
            .save_dynamic("stored", "cached answer")
            .await
            .unwrap();

        let response = h.chain.answer("query").await;

        assert_eq!(response.source, AnswerSource::Rag);
        assert_eq!(response.answer, "생성된 답변");
        assert_eq!(h.retriever.calls(), 1);
    }

    #[tokio::test]
    async fn test_question_is_trimmed_before_lookup() {
        let h = harness().await;
        h.chain.answer("통관 절차").await;

        let response = h.chain.answer("  통관 절차  ").await;

        assert_eq!(response.source, AnswerSource::Cag);
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.retriever.last_query().as_deref(), Some("통관 절차"));
    }

    #[tokio::test]
    async fn test_index_outage_degrades_to_fallback() {
        let h = harness().await;
        h.chain.cache().index().backend().set_available(false);

        let response = h.chain.answer("통관 절차").await;

        assert_eq!(response.source, AnswerSource::Rag);
        assert_eq!(response.answer, "생성된 답변");
        assert_eq!(response.outcome, ChainOutcome::Answered { cache_key: None });
    }
}

mod generation_tests {
    use super::*;

    #[tokio::test]
    async fn test_miss_generates_and_writes_back() {
        let h = harness().await;

        let response = h.chain.answer("수입신고 기한은?").await;

        assert_eq!(response.answer, "생성된 답변");
        assert_eq!(response.source, AnswerSource::Rag);
        assert!(!response.cache_hit);
        assert_eq!(
            response.outcome,
            ChainOutcome::Answered {
                cache_key: Some(dynamic_cache_key("수입신고 기한은?"))
            }
        );
        assert_eq!(
            h.chain.cache().window().keys().await,
            vec![dynamic_cache_key("수입신고 기한은?")]
        );

        let again = h.chain.answer("수입신고 기한은?").await;
        assert_eq!(again.source, AnswerSource::Cag);
        assert_eq!(again.answer, "생성된 답변");
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_context_lists_passages_with_sources() {
        let h = harness().await;
        h.chain.answer("환급 기한").await;

        let context = h.generator.last_context().unwrap();
        assert!(context.starts_with("--- Document 1 (source: 관세법.pdf) ---\n"));
        assert!(context.contains("--- Document 2 (source: 고시.pdf) ---\n환급은"));
    }

    #[tokio::test]
    async fn test_retrieval_top_k_is_honored() {
        let h = harness_with(
            ChainConfig::default().retrieval_top_k(1),
            SemanticCacheConfig::default(),
        )
        .await;
        h.chain.answer("환급 기한").await;

        let context = h.generator.last_context().unwrap();
        assert!(!context.contains("Document 2"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_cached() {
        let h = harness().await;
        h.generator.set_failure(Some(GenerationError::Provider {
            reason: "model not found".to_string(),
        }));

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.source, AnswerSource::Rag);
        assert!(!response.cache_hit);
        assert_eq!(response.outcome, ChainOutcome::GenerationFailed);
        assert!(response.answer.starts_with("❌"));
        assert!(h.chain.cache().window().is_empty().await);
        assert!(h.chain.cache().index().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_failure_message() {
        let h = harness().await;
        h.generator.set_failure(Some(GenerationError::Connection {
            reason: "connection refused".to_string(),
        }));

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.answer, h.chain.messages().generation_unavailable);
    }

    #[tokio::test]
    async fn test_generation_timeout_leaves_cache_unchanged() {
        let h = harness_with(
            ChainConfig::default().generation_timeout(Duration::from_millis(20)),
            SemanticCacheConfig::default(),
        )
        .await;
        h.generator.set_delay(Some(Duration::from_millis(300)));

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(
            response.answer,
            "❌ 응답 시간을 초과했습니다. 잠시 후 다시 시도해주세요."
        );
        assert_eq!(response.outcome, ChainOutcome::GenerationFailed);
        assert_eq!(h.chain.cache().index().len().await.unwrap(), 0);
        assert!(h.chain.cache().window().is_empty().await);
    }

    #[tokio::test]
    async fn test_blank_generation_is_failure() {
        let h = harness().await;
        h.generator.set_answer("  \n ");

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.outcome, ChainOutcome::GenerationFailed);
        assert_eq!(response.answer, h.chain.messages().generation_failed);
        assert!(h.chain.cache().window().is_empty().await);
    }

    #[tokio::test]
    async fn test_embedding_outage_still_answers() {
        let h = harness().await;
        h.embedder.set_failing(true);

        let response = h.chain.answer("관세율은?").await;

        assert_eq!(response.source, AnswerSource::Rag);
        assert_eq!(response.answer, "생성된 답변");
        assert_eq!(response.outcome, ChainOutcome::Answered { cache_key: None });
        assert_eq!(h.retriever.calls(), 1);
    }

    #[tokio::test]
    async fn test_write_back_respects_window() {
        let h = harness_with(
            ChainConfig::default(),
            SemanticCacheConfig::default().dynamic_cache_size(2),
        )
        .await;

        for (i, question) in ["첫 질문", "둘째 질문", "셋째 질문"].iter().enumerate() {
            h.embedder.pin(question, basis(i + 1));
            h.chain.answer(question).await;
        }

        assert_eq!(
            h.chain.cache().window().keys().await,
            vec![dynamic_cache_key("둘째 질문"), dynamic_cache_key("셋째 질문")]
        );
        assert_eq!(h.chain.cache().index().len().await.unwrap(), 2);
    }
}

mod type_tests {
    use super::*;

    #[test]
    fn test_response_serializes_without_outcome() {
        let response = ChainResponse::new(
            "답",
            AnswerSource::Cag,
            ChainOutcome::Hit {
                key: "cache:x".to_string(),
                similarity: 0.9,
            },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"answer": "답", "cache_hit": true, "source": "CAG"})
        );
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(
            serde_json::to_string(&AnswerSource::None).unwrap(),
            "\"NONE\""
        );
        assert_eq!(AnswerSource::Rag.to_string(), "RAG");
    }

    #[test]
    fn test_request_deserializes() {
        let request: ChainRequest = serde_json::from_str(r#"{"question": "통관?"}"#).unwrap();
        assert_eq!(request, ChainRequest::new("통관?"));
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_config_validation() {
        assert!(ChainConfig::default().validate().is_ok());
        assert!(ChainConfig::default().threshold(-0.1).validate().is_err());
        assert!(ChainConfig::default().cache_top_k(0).validate().is_err());
        assert!(ChainConfig::default().retrieval_top_k(0).validate().is_err());
        assert!(
            ChainConfig::default()
                .generation_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_default_chain_threshold() {
        assert!((ChainConfig::default().threshold - 0.85).abs() < f32::EPSILON);
    }
}

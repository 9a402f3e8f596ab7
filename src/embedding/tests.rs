use super::mock::{axis, vector_with_similarity};
use super::ollama::parse_embed_response;
use super::stub::stub_seed;
use super::*;
use serde_json::json;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

mod stub_tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic() {
        let embedder = StubEmbedder::default();
        let a = embedder.embed("관세 환급 절차").await.unwrap();
        let b = embedder.embed("관세 환급 절차").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_stub_dimension() {
        let embedder = StubEmbedder::new(64);
        let v = embedder.embed("x").await.unwrap();
        assert_eq!(v.len(), 64);
        assert_eq!(embedder.embedding_dim(), 64);
    }

    #[tokio::test]
    async fn test_stub_is_unit_length() {
        let embedder = StubEmbedder::default();
        let v = embedder.embed("normalize me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_stub_distinct_texts_are_dissimilar() {
        let embedder = StubEmbedder::default();
        let a = embedder.embed("수입 신고 방법").await.unwrap();
        let b = embedder.embed("여행자 휴대품 면세 한도").await.unwrap();
        assert!(cosine(&a, &b) < 0.5);
    }

    #[tokio::test]
    async fn test_stub_zero_dim_fails() {
        let embedder = StubEmbedder::new(0);
        assert!(matches!(
            embedder.embed("x").await,
            Err(EmbeddingError::EmptyEmbedding)
        ));
    }

    #[test]
    fn test_stub_seed_is_blake3_derived() {
        let text = "관세 환급 절차";
        assert_eq!(stub_seed(text), crate::hashing::hash_to_u64(text.as_bytes()));

        let state = stub_seed(text)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        let first = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        let v = StubEmbedder::new(1).embed_sync(text);
        assert!((v[0] - first.signum()).abs() < 1e-6);
    }

    #[test]
    fn test_stub_model_id() {
        assert_eq!(StubEmbedder::default().model_id(), "stub");
    }
}

mod ollama_tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(
            OllamaEmbedderConfig::new("http://localhost:11434", "bge-m3")
                .validate()
                .is_ok()
        );
        assert!(matches!(
            OllamaEmbedderConfig::new("", "bge-m3").validate(),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
        assert!(matches!(
            OllamaEmbedderConfig::new("http://localhost:11434", " ").validate(),
            Err(EmbeddingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(OllamaEmbedder::new(OllamaEmbedderConfig::new("", "m")).is_err());
    }

    #[test]
    fn test_model_id() {
        let embedder =
            OllamaEmbedder::new(OllamaEmbedderConfig::new("http://localhost:11434", "bge-m3"))
                .unwrap();
        assert_eq!(embedder.model_id(), "bge-m3");
    }

    #[test]
    fn test_parse_embed_response() {
        let body = json!({"model": "bge-m3", "embeddings": [[0.5, -0.25, 1.0]]});
        let v = parse_embed_response(&body).unwrap();
        assert_eq!(v, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_parse_embed_response_missing_field() {
        let body = json!({"embedding": [0.1]});
        assert!(matches!(
            parse_embed_response(&body),
            Err(EmbeddingError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_embed_response_empty_vector() {
        let body = json!({"embeddings": [[]]});
        assert!(matches!(
            parse_embed_response(&body),
            Err(EmbeddingError::EmptyEmbedding)
        ));
    }

    #[test]
    fn test_parse_embed_response_non_numeric() {
        let body = json!({"embeddings": [[0.1, "x"]]});
        assert!(matches!(
            parse_embed_response(&body),
            Err(EmbeddingError::InvalidResponse { .. })
        ));
    }
}

mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_pinned_vectors_have_requested_similarity() {
        let embedder = MockEmbedder::new(8);
        embedder.pin("stored", axis(8));
        embedder.pin("query", vector_with_similarity(8, 0.9));

        let a = embedder.embed("stored").await.unwrap();
        let b = embedder.embed("query").await.unwrap();

        assert!((cosine(&a, &b) - 0.9).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_unpinned_falls_back_to_stub() {
        let embedder = MockEmbedder::new(16);
        let stub = StubEmbedder::new(16);
        assert_eq!(
            embedder.embed("free text").await.unwrap(),
            stub.embed_sync("free text")
        );
    }

    #[tokio::test]
    async fn test_failure_toggle_and_call_count() {
        let embedder = MockEmbedder::new(8);
        embedder.set_failing(true);
        assert!(embedder.embed("x").await.is_err());
        embedder.set_failing(false);
        assert!(embedder.embed("x").await.is_ok());
        assert_eq!(embedder.calls(), 2);
    }
}

#[test]
fn test_normalize_zero_vector_is_untouched() {
    let mut v = vec![0.0, 0.0];
    normalize(&mut v);
    assert_eq!(v, vec![0.0, 0.0]);
}

#[test]
fn test_error_display() {
    let err = EmbeddingError::Timeout { millis: 250 };
    assert_eq!(err.to_string(), "embedding timed out after 250 ms");
}

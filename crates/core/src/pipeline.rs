use crate::cache::ContextCache;
use crate::embeddings::Embedder;
use crate::error::{AnswerError, EmbeddingError};
use crate::generator::Generator;
use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;
use crate::sanitize::strip_reasoning;
use tokio::sync::Mutex;
use tracing::debug;

const CONTEXT_SEPARATOR: &str = "\n\n";

/// The per-question answering flow: cached retrieval, prompt composition,
/// generation, sanitization. Stateless per call beyond the shared cache and
/// index; safe to share behind an `Arc` across concurrent requests.
pub struct AnswerPipeline<E: Embedder, G: Generator> {
    retriever: Retriever<E>,
    cache: Mutex<ContextCache>,
    prompt: PromptBuilder,
    generator: G,
}

impl<E: Embedder, G: Generator> AnswerPipeline<E, G> {
    pub fn new(
        retriever: Retriever<E>,
        cache_capacity: usize,
        prompt: PromptBuilder,
        generator: G,
    ) -> Self {
        Self {
            retriever,
            cache: Mutex::new(ContextCache::new(cache_capacity)),
            prompt,
            generator,
        }
    }

    /// Answer one question end to end. Retrieval and generation failures stay
    /// distinct so the caller can report which stage broke.
    pub async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let context = self.context_for(question).await?;
        let prompt = self.prompt.render(&context, question);
        let raw = self.generator.generate(&prompt).await?;
        Ok(strip_reasoning(&raw))
    }

    /// Memoized retrieval: return the cached context for a previously seen
    /// question, otherwise retrieve top-k chunks and join their texts with a
    /// blank line. Failed retrievals are never cached.
    async fn context_for(&self, question: &str) -> Result<String, EmbeddingError> {
        if let Some(context) = self.cache.lock().await.get(question) {
            debug!("context cache hit");
            return Ok(context);
        }

        let hits = self.retriever.retrieve(question).await?;
        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        self.cache
            .lock()
            .await
            .insert(question.to_string(), context.clone());
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::AnswerPipeline;
    use crate::embeddings::Embedder;
    use crate::error::{AnswerError, EmbeddingError, GenerationError};
    use crate::generator::Generator;
    use crate::index::VectorIndex;
    use crate::models::DocChunk;
    use crate::prompt::{PromptBuilder, PromptVariant};
    use crate::retriever::Retriever;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    /// Deterministic embedder that counts how often the service is hit.
    struct CountingEmbedder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut vector = vec![0f32; 8];
            for (position, byte) in text.bytes().enumerate() {
                vector[position % 8] += f32::from(byte) / 255.0;
            }
            Ok(vector)
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::MalformedResponse("down".to_string()))
        }
    }

    /// Generator fake that records prompts and emits a canned raw answer with
    /// a reasoning trace.
    struct FakeGenerator {
        prompts: StdMutex<Vec<String>>,
        raw_answer: String,
    }

    impl FakeGenerator {
        fn new(raw_answer: &str) -> Self {
            Self {
                prompts: StdMutex::new(Vec::new()),
                raw_answer: raw_answer.to_string(),
            }
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts
                .lock()
                .expect("prompt log")
                .push(prompt.to_string());
            Ok(self.raw_answer.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Backend {
                status: "503 Service Unavailable".to_string(),
                details: String::new(),
            })
        }
    }

    fn chunk(index: u64, text: &str) -> DocChunk {
        DocChunk {
            chunk_id: format!("chunk-{index}"),
            document_id: "doc-1".to_string(),
            source_path: "/tmp/rules.pdf".to_string(),
            page: 1,
            chunk_index: index,
            text: text.to_string(),
        }
    }

    async fn rules_index(calls: Arc<AtomicUsize>) -> Arc<VectorIndex> {
        let embedder = CountingEmbedder { calls };
        let chunks = vec![
            chunk(
                0,
                "A try is scored by grounding the ball in the opponent's in-goal area.",
            ),
            chunk(1, "A conversion kick follows each try."),
            chunk(2, "A match lasts eighty minutes."),
        ];
        Arc::new(
            VectorIndex::build("rules", chunks, &embedder)
                .await
                .expect("build index"),
        )
    }

    fn pipeline_with(
        index: Arc<VectorIndex>,
        calls: Arc<AtomicUsize>,
        cache_capacity: usize,
        generator: FakeGenerator,
    ) -> AnswerPipeline<CountingEmbedder, FakeGenerator> {
        let retriever = Retriever::new(index, CountingEmbedder { calls }, 3);
        let prompt = PromptBuilder::new(PromptVariant::Permissive, "rugby");
        AnswerPipeline::new(retriever, cache_capacity, prompt, generator)
    }

    #[tokio::test]
    async fn answer_is_sanitized_and_grounded_in_retrieved_context() {
        let build_calls = Arc::new(AtomicUsize::new(0));
        let index = rules_index(Arc::clone(&build_calls)).await;

        let query_calls = Arc::new(AtomicUsize::new(0));
        let generator = FakeGenerator::new(
            "<think>the context mentions grounding</think>A try is scored by grounding the ball.",
        );
        let pipeline = pipeline_with(index, Arc::clone(&query_calls), 10, generator);

        let answer = pipeline.answer("What is a try?").await.expect("answer");
        assert_eq!(answer, "A try is scored by grounding the ball.");
        assert!(!answer.contains("<think>"));

        let prompts = pipeline.generator.prompts.lock().expect("prompt log");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: What is a try?"));
        assert!(prompts[0].contains("grounding the ball"));
    }

    #[tokio::test]
    async fn repeated_question_retrieves_only_once() {
        let build_calls = Arc::new(AtomicUsize::new(0));
        let index = rules_index(Arc::clone(&build_calls)).await;

        let query_calls = Arc::new(AtomicUsize::new(0));
        let generator = FakeGenerator::new("Answer.");
        let pipeline = pipeline_with(index, Arc::clone(&query_calls), 10, generator);

        let first = pipeline.answer("What is a try?").await.expect("first");
        let second = pipeline.answer("What is a try?").await.expect("second");

        assert_eq!(first, second);
        assert_eq!(query_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn evicted_question_triggers_a_fresh_retrieval() {
        let build_calls = Arc::new(AtomicUsize::new(0));
        let index = rules_index(Arc::clone(&build_calls)).await;

        let query_calls = Arc::new(AtomicUsize::new(0));
        let generator = FakeGenerator::new("Answer.");
        let pipeline = pipeline_with(index, Arc::clone(&query_calls), 1, generator);

        pipeline.answer("q1").await.expect("q1");
        pipeline.answer("q2").await.expect("q2 evicts q1");
        pipeline.answer("q1").await.expect("q1 again");

        assert_eq!(query_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retrieval_failure_is_not_cached() {
        let build_calls = Arc::new(AtomicUsize::new(0));
        let index = rules_index(Arc::clone(&build_calls)).await;

        let retriever = Retriever::new(index, FailingEmbedder, 2);
        let prompt = PromptBuilder::new(PromptVariant::Permissive, "rugby");
        let pipeline =
            AnswerPipeline::new(retriever, 10, prompt, FakeGenerator::new("unreached"));

        let result = pipeline.answer("What is a try?").await;
        assert!(matches!(result, Err(AnswerError::Retrieval(_))));
        assert!(pipeline.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_distinct_from_retrieval_failure() {
        let build_calls = Arc::new(AtomicUsize::new(0));
        let index = rules_index(Arc::clone(&build_calls)).await;

        let query_calls = Arc::new(AtomicUsize::new(0));
        let retriever = Retriever::new(
            index,
            CountingEmbedder { calls: query_calls },
            2,
        );
        let prompt = PromptBuilder::new(PromptVariant::Permissive, "rugby");
        let pipeline = AnswerPipeline::new(retriever, 10, prompt, FailingGenerator);

        let result = pipeline.answer("What is a try?").await;
        assert!(matches!(result, Err(AnswerError::Generation(_))));
    }
}

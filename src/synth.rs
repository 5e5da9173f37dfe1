use crate::config::RetrievalConfig;
use crate::error::{ModelError, SynthesisError};
use crate::index::SemanticIndex;
use crate::llm::{Embedder, LanguageModel};
use crate::results::{AnswerResult, Corpus};
use std::sync::Arc;

/// Builds the extraction prompt from retrieved passages and the instruction
pub fn extraction_prompt(passages: &str, instruction: &str) -> String {
    format!(
        "You are data extraction agent, extract info from the below response relevant to the prompt.\n\n\
         Response: \n\n{passages}\n\n\
         prompt \n{instruction}"
    )
}

/// Turns a corpus and an instruction into an answer grounded in the corpus
#[derive(Clone)]
pub struct Synthesizer {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    retrieval: RetrievalConfig,
}

impl Synthesizer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            model,
            retrieval,
        }
    }

    pub async fn synthesize(
        &self,
        corpus: &Corpus,
        instruction: &str,
    ) -> Result<AnswerResult, SynthesisError> {
        let index =
            SemanticIndex::build(&corpus.text(), self.embedder.as_ref(), &self.retrieval).await?;

        let query = self
            .embedder
            .embed(instruction)
            .await
            .map_err(SynthesisError::Embedding)?;

        let hits = index.retrieve(&query, self.retrieval.top_k);
        ::log::info!(
            "Retrieved {} of {} passages for the instruction",
            hits.len(),
            index.passages().len()
        );

        let context = hits
            .iter()
            .map(|hit| hit.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = extraction_prompt(&context, instruction);

        let output = self
            .model
            .invoke(&prompt)
            .await
            .map_err(SynthesisError::Generation)?;

        let content = output.trim();
        if content.is_empty() {
            return Err(SynthesisError::Generation(ModelError::malformed(
                "model returned an empty answer",
            )));
        }
        Ok(AnswerResult::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PageDocument;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ConstEmbedder;

    #[async_trait]
    impl Embedder for ConstEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
            Ok(vec![1.0, text.len() as f32])
        }
    }

    #[derive(Default)]
    struct RecordingModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn corpus() -> Corpus {
        Corpus::new(vec![PageDocument::new(
            "https://example.com/",
            "Headline one\n\nHeadline two",
        )])
    }

    #[test]
    fn test_prompt_template() {
        let prompt = extraction_prompt("PASSAGES", "Get headlines");
        assert!(prompt.starts_with("You are data extraction agent"));
        assert!(prompt.contains("Response: \n\nPASSAGES\n\n"));
        assert!(prompt.ends_with("prompt \nGet headlines"));
    }

    #[tokio::test]
    async fn test_synthesize_uses_retrieved_context() {
        let model = Arc::new(RecordingModel {
            reply: "  Headline one; Headline two \n".to_string(),
            ..RecordingModel::default()
        });
        let synthesizer =
            Synthesizer::new(Arc::new(ConstEmbedder), model.clone(), RetrievalConfig::default());

        let answer = synthesizer.synthesize(&corpus(), "Get headlines").await.unwrap();
        assert_eq!(answer.content, "Headline one; Headline two");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Headline one\n\nHeadline two"));
        assert!(prompts[0].ends_with("Get headlines"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let model = Arc::new(RecordingModel::default());
        let synthesizer =
            Synthesizer::new(Arc::new(ConstEmbedder), model, RetrievalConfig::default());

        let err = synthesizer.synthesize(&corpus(), "x").await.unwrap_err();
        assert!(matches!(err, SynthesisError::Generation(_)));
    }
}

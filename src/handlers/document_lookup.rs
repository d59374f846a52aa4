//! Document lookup handler
//!
//! Answers the `rag` route: retrieves the best matching passages from the
//! document index named by the request's context handle and asks the
//! language model to answer from them.

use crate::llm::prompts::grounded_answer_prompt;
use crate::pipeline::collaborators::{Handler, LanguageModel};
use crate::pipeline::error::CollaboratorError;
use crate::pipeline::types::PipelineRequest;
use crate::services::documents::DocumentLibrary;
use async_trait::async_trait;
use std::sync::Arc;

/// Handler for the `rag` route
pub struct DocumentLookupHandler {
    library: Arc<DocumentLibrary>,
    model: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl DocumentLookupHandler {
    /// Create a handler over `library`, answering with `model`
    pub fn new(library: Arc<DocumentLibrary>, model: Arc<dyn LanguageModel>, top_k: usize) -> Self {
        Self {
            library,
            model,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait]
impl Handler for DocumentLookupHandler {
    async fn handle(&self, request: &PipelineRequest) -> Result<String, CollaboratorError> {
        let index = self.library.resolve(request.context());
        let passages: Vec<String> = index
            .search(request.query(), self.top_k)
            .into_iter()
            .map(|p| p.text.clone())
            .collect();

        tracing::debug!(
            index = %index.name(),
            passages = passages.len(),
            "Retrieved passages for document lookup"
        );

        if passages.is_empty() {
            return Err(CollaboratorError::Empty(format!(
                "no passages in document index '{}' match the query",
                index.name()
            )));
        }

        self.model
            .generate(&grounded_answer_prompt(request.query(), &passages))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ContextHandle;
    use crate::services::documents::DocumentIndex;
    use std::sync::Mutex;

    struct EchoPrompt {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for EchoPrompt {
        async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            Ok("grounded answer".to_string())
        }
    }

    fn library() -> Arc<DocumentLibrary> {
        let mut library = DocumentLibrary::fallback();
        let mut hr = DocumentIndex::new("hr");
        hr.add_document("leave.txt", "Annual leave is 25 days per year.");
        library.insert(hr);
        Arc::new(library)
    }

    #[tokio::test]
    async fn test_lookup_uses_context_index() {
        let model = Arc::new(EchoPrompt {
            calls: Mutex::new(Vec::new()),
        });
        let handler = DocumentLookupHandler::new(library(), model.clone(), 4);

        let request = PipelineRequest::new("How many days of annual leave?")
            .with_context(ContextHandle::new("hr"));
        let answer = handler.handle(&request).await.unwrap();

        assert_eq!(answer, "grounded answer");
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("[1] Annual leave is 25 days per year."));
    }

    #[tokio::test]
    async fn test_lookup_without_matches_skips_model() {
        let model = Arc::new(EchoPrompt {
            calls: Mutex::new(Vec::new()),
        });
        let handler = DocumentLookupHandler::new(library(), model.clone(), 4);

        let result = handler
            .handle(&PipelineRequest::new("annual leave allowance"))
            .await;

        // Default index is the fallback knowledge base, which says nothing about leave
        assert!(result.unwrap_err().to_string().contains("'default'"));
        assert!(model.calls.lock().unwrap().is_empty());
    }
}

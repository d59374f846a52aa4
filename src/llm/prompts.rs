//! Prompt templates for the model-backed collaborators

/// Ask the model to pick one of `labels` for `query`
pub fn classification_prompt(query: &str, labels: &[&str]) -> String {
    format!(
        "Classify the query into one of [{}]. Reply with the label only.\n\nQuery: {}\n\nAnswer:",
        labels.join(", "),
        query
    )
}

/// Ask the model to condense `content`
pub fn summary_prompt(content: &str) -> String {
    format!("Summarize clearly and concisely:\n\n{}", content)
}

/// Ask the model to answer `query` using only the numbered `passages`
pub fn grounded_answer_prompt(query: &str, passages: &[String]) -> String {
    let context = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("[{}] {}", i + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_prompt_lists_labels() {
        let prompt = classification_prompt("What is LangGraph?", &["web", "rag", "llm"]);
        assert!(prompt.contains("[web, rag, llm]"));
        assert!(prompt.contains("Query: What is LangGraph?"));
    }

    #[test]
    fn test_grounded_prompt_numbers_passages() {
        let passages = vec!["first".to_string(), "second".to_string()];
        let prompt = grounded_answer_prompt("q?", &passages);
        assert!(prompt.contains("[1] first"));
        assert!(prompt.contains("[2] second"));
        assert!(prompt.ends_with("Question: q?\nHelpful Answer:"));
    }
}

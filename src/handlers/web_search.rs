//! Web search handler
//!
//! Answers the `web` route from the DuckDuckGo Instant Answer API. The API
//! returns structured JSON rather than a results page, so the answer is
//! assembled from its direct-answer, abstract, definition and related-topic
//! fields.

use crate::config::SearchConfig;
use crate::pipeline::collaborators::Handler;
use crate::pipeline::error::CollaboratorError;
use crate::pipeline::types::PipelineRequest;
use async_trait::async_trait;
use serde::Deserialize;

/// Instant Answer API response (only the fields we read)
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    /// Page heading for the matched topic
    #[serde(default)]
    pub heading: String,
    /// Direct answer; a string for most queries, an object for some widgets
    #[serde(default)]
    pub answer: serde_json::Value,
    /// Plain-text abstract of the topic
    #[serde(default)]
    pub abstract_text: String,
    /// Source of the abstract
    #[serde(default, rename = "AbstractURL")]
    pub abstract_url: String,
    /// Dictionary definition, if any
    #[serde(default)]
    pub definition: String,
    /// Related topics, possibly grouped
    #[serde(default)]
    pub related_topics: Vec<RelatedTopic>,
}

/// Related topic entry: either a single topic or a named group of topics
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RelatedTopic {
    /// A single topic
    Topic {
        /// Topic text
        #[serde(rename = "Text")]
        text: String,
        /// Link to the topic
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    /// A named group of topics
    Group {
        /// Group name
        #[serde(rename = "Name")]
        name: String,
        /// Topics in the group
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl InstantAnswer {
    /// Render the response as answer text, or `None` if it carries nothing
    pub fn to_answer(&self, max_related_topics: usize) -> Option<String> {
        let mut sections = Vec::new();

        if let Some(answer) = self.answer.as_str().filter(|a| !a.trim().is_empty()) {
            sections.push(format!("Answer: {}", answer.trim()));
        }

        if !self.abstract_text.trim().is_empty() {
            let mut section = if self.heading.is_empty() {
                self.abstract_text.trim().to_string()
            } else {
                format!("{}: {}", self.heading, self.abstract_text.trim())
            };
            if !self.abstract_url.is_empty() {
                section.push_str(&format!(" ({})", self.abstract_url));
            }
            sections.push(section);
        }

        if !self.definition.trim().is_empty() {
            sections.push(format!("Definition: {}", self.definition.trim()));
        }

        let mut topics = Vec::new();
        collect_topics(&self.related_topics, max_related_topics, &mut topics);
        if !topics.is_empty() {
            sections.push(format!("Related:\n{}", topics.join("\n")));
        }

        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        }
    }
}

fn collect_topics(topics: &[RelatedTopic], limit: usize, out: &mut Vec<String>) {
    for topic in topics {
        if out.len() >= limit {
            return;
        }
        match topic {
            RelatedTopic::Topic { text, first_url } if !text.trim().is_empty() => {
                if first_url.is_empty() {
                    out.push(format!("- {}", text.trim()));
                } else {
                    out.push(format!("- {} ({})", text.trim(), first_url));
                }
            }
            RelatedTopic::Topic { .. } => {}
            RelatedTopic::Group { topics, .. } => collect_topics(topics, limit, out),
        }
    }
}

/// Handler for the `web` route
#[derive(Clone)]
pub struct WebSearchHandler {
    http: reqwest::Client,
    base_url: String,
    max_related_topics: usize,
}

impl WebSearchHandler {
    /// Create a handler from configuration
    pub fn new(http: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_related_topics: config.max_related_topics,
        }
    }

    /// Query the Instant Answer API
    pub async fn search(&self, query: &str) -> Result<InstantAnswer, CollaboratorError> {
        tracing::debug!(query_len = query.len(), "Calling web search API");

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| CollaboratorError::Request(format!("Web search failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status_code = status.as_u16(), "Web search returned error status");
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            CollaboratorError::Request(format!("Failed to read web search response: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            CollaboratorError::InvalidResponse(format!(
                "Failed to parse web search response: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl Handler for WebSearchHandler {
    async fn handle(&self, request: &PipelineRequest) -> Result<String, CollaboratorError> {
        let result = self.search(request.query()).await?;
        result
            .to_answer(self.max_related_topics)
            .ok_or_else(|| CollaboratorError::Empty("web search returned no results".to_string()))
    }
}

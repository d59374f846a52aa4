//! Document store for the lookup route
//!
//! Loads plain-text documents from a data folder into small in-memory
//! keyword indexes. Files at the top of the folder form the `default`
//! index; each subfolder becomes an index named after it, addressable
//! through a request's context handle.

use crate::error::AppError;
use crate::pipeline::types::ContextHandle;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs;

/// Name of the index built from top-level files
pub const DEFAULT_INDEX: &str = "default";

/// Passage length target in characters
pub const CHUNK_SIZE: usize = 500;

/// Characters repeated between consecutive passages
pub const CHUNK_OVERLAP: usize = 50;

/// File extensions picked up by `load_dir`
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "how", "its", "who", "did", "what", "when", "where", "which",
    "why", "with", "this", "that", "from", "they", "will", "would", "there", "their", "about",
    "into", "than", "then", "them", "these", "those", "does", "is",
];

/// Knowledge base used when the data folder has no usable documents
const FALLBACK_DOCUMENTS: &[(&str, &str)] = &[
    (
        "builtin:pipeline",
        "The research pipeline classifies each question and routes it to web search, \
document lookup, or a direct answer from the language model.",
    ),
    (
        "builtin:summaries",
        "Every answer produced by the research pipeline is summarized before it is returned, \
including explanations of failures.",
    ),
];

/// A retrievable chunk of a document
#[derive(Debug, Clone)]
pub struct Passage {
    /// Where the passage came from (file path or builtin id)
    pub source: String,
    /// Passage text
    pub text: String,
    terms: HashSet<String>,
}

impl Passage {
    fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let terms = tokenize(&text).collect();
        Self {
            source: source.into(),
            text,
            terms,
        }
    }
}

/// In-memory keyword index over passages
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    name: String,
    passages: Vec<Passage>,
}

impl DocumentIndex {
    /// Create an empty index
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passages: Vec::new(),
        }
    }

    /// Built-in fallback knowledge base
    pub fn fallback() -> Self {
        let mut index = Self::new(DEFAULT_INDEX);
        for (source, text) in FALLBACK_DOCUMENTS {
            index.add_document(*source, text);
        }
        index
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// True if the index has no passages
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Chunk `text` and add its passages
    pub fn add_document(&mut self, source: &str, text: &str) {
        for chunk in chunk_text(text, CHUNK_SIZE, CHUNK_OVERLAP) {
            self.passages.push(Passage::new(source, chunk));
        }
    }

    /// Top `k` passages sharing at least one term with `query`
    ///
    /// Passages are ranked by the number of distinct query terms they
    /// contain; ties keep document order.
    pub fn search(&self, query: &str, k: usize) -> Vec<&Passage> {
        let query_terms: HashSet<String> = tokenize(query).collect();
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Passage)> = self
            .passages
            .iter()
            .map(|p| (query_terms.iter().filter(|t| p.terms.contains(*t)).count(), p))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps document order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(k).map(|(_, p)| p).collect()
    }
}

/// Named document indexes with a default
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    indexes: HashMap<String, DocumentIndex>,
}

impl DocumentLibrary {
    /// Library holding only the built-in fallback knowledge base
    pub fn fallback() -> Self {
        Self::from_default(DocumentIndex::fallback())
    }

    /// Library whose default index is `index` (renamed to `default`)
    pub fn from_default(mut index: DocumentIndex) -> Self {
        index.name = DEFAULT_INDEX.to_string();
        let mut indexes = HashMap::new();
        indexes.insert(DEFAULT_INDEX.to_string(), index);
        Self { indexes }
    }

    /// Add or replace a named index
    pub fn insert(&mut self, index: DocumentIndex) {
        self.indexes.insert(index.name.clone(), index);
    }

    /// Index for a context handle; absent or unknown handles get the default
    pub fn resolve(&self, context: Option<&ContextHandle>) -> &DocumentIndex {
        if let Some(index) = context.and_then(|c| self.indexes.get(c.as_str())) {
            return index;
        }
        if let Some(context) = context {
            tracing::debug!(
                context = %context.as_str(),
                "Unknown document index, using default"
            );
        }
        &self.indexes[DEFAULT_INDEX]
    }

    /// Sorted index names
    pub fn index_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.indexes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load documents from `dir`
    ///
    /// A missing folder, or one without usable top-level documents, yields
    /// the built-in fallback as the default index.
    ///
    /// # Errors
    /// * `AppError::Documents` - If the folder exists but cannot be read
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        if !fs::try_exists(dir).await.unwrap_or(false) {
            tracing::info!(data_dir = %dir.display(), "Data folder not found, using fallback knowledge base");
            return Ok(Self::fallback());
        }

        let (default_index, subdirs) = load_index(dir, DEFAULT_INDEX).await?;
        let mut library = if default_index.is_empty() {
            tracing::info!(data_dir = %dir.display(), "No top-level documents, using fallback knowledge base");
            Self::fallback()
        } else {
            Self::from_default(default_index)
        };

        for subdir in subdirs {
            let Some(name) = subdir.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            if name == DEFAULT_INDEX {
                continue;
            }
            let (index, _) = load_index(&subdir, &name).await?;
            if !index.is_empty() {
                library.insert(index);
            }
        }

        for name in library.index_names() {
            tracing::info!(
                index = %name,
                passages = library.indexes[name].len(),
                "Document index loaded"
            );
        }

        Ok(library)
    }
}

/// Read the supported files directly inside `dir` into one index
async fn load_index(
    dir: &Path,
    name: &str,
) -> Result<(DocumentIndex, Vec<std::path::PathBuf>), AppError> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        AppError::Documents(format!("Failed to read directory: {} - {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        AppError::Documents(format!(
            "Failed to read directory entry: {} - {}",
            dir.display(),
            e
        ))
    })? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| {
            AppError::Documents(format!("Failed to read metadata: {} - {}", path.display(), e))
        })?;

        if file_type.is_dir() {
            subdirs.push(path);
        } else if is_supported(&path) {
            files.push(path);
        }
    }

    // Directory order is platform dependent
    files.sort();
    subdirs.sort();

    let mut index = DocumentIndex::new(name);
    for path in files {
        match fs::read_to_string(&path).await {
            Ok(text) if !text.trim().is_empty() => {
                index.add_document(&path.to_string_lossy(), &text);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document");
            }
        }
    }

    Ok((index, subdirs))
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lowercase alphanumeric terms of 3+ characters, minus stop words
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

/// Split `text` into word-aligned chunks of about `chunk_size` characters,
/// each starting with up to `overlap` characters from the end of the
/// previous chunk
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let mut end = start;
        let mut len = 0;
        while end < words.len() {
            let added = words[end].len() + usize::from(end > start);
            if end > start && len + added > chunk_size {
                break;
            }
            len += added;
            end += 1;
        }

        chunks.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }

        // Walk back from `end` while the overlap fits; always advance past `start`
        let mut next = end;
        let mut overlap_len = 0;
        while next > start + 1 {
            let added = words[next - 1].len() + 1;
            if overlap_len + added > overlap {
                break;
            }
            overlap_len += added;
            next -= 1;
        }
        start = next;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_text_short_input_is_one_chunk() {
        assert_eq!(chunk_text("a b c", 500, 50), vec!["a b c".to_string()]);
        assert!(chunk_text("   ", 500, 50).is_empty());
    }

    #[test]
    fn test_chunk_text_respects_size_and_overlap() {
        let text = (0..200).map(|i| format!("word{:03}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&text, 100, 20);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100, "chunk too long: {}", chunk.len());
        }
        // Consecutive chunks share their boundary words
        assert!(chunks[0].ends_with("word011"));
        assert!(chunks[1].starts_with("word010 word011 word012"));
        // Every word survives chunking
        assert!(chunks.last().unwrap().ends_with("word199"));
    }

    #[test]
    fn test_chunk_text_oversized_word_still_progresses() {
        let long = "x".repeat(80);
        let text = format!("{} {} {}", long, long, long);
        let chunks = chunk_text(&text, 50, 10);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_search_ranks_by_distinct_terms() {
        let mut index = DocumentIndex::new("test");
        index.add_document("a.txt", "Tokio is an asynchronous runtime.");
        index.add_document("b.txt", "Axum is a web framework built on tokio and hyper.");
        index.add_document("c.txt", "Bread recipes need flour.");

        let results = index.search("Which web framework uses tokio?", 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "b.txt");
        assert_eq!(results[1].source, "a.txt");
    }

    #[test]
    fn test_search_without_matching_terms() {
        let index = DocumentIndex::fallback();
        assert!(index.search("quantum chromodynamics", 4).is_empty());
        assert!(index.search("is it?", 4).is_empty());
        assert!(!index.search("how are answers summarized", 4).is_empty());
    }

    #[test]
    fn test_library_resolves_unknown_context_to_default() {
        let mut library = DocumentLibrary::fallback();
        let mut notes = DocumentIndex::new("notes");
        notes.add_document("n.txt", "meeting notes");
        library.insert(notes);

        assert_eq!(library.resolve(None).name(), DEFAULT_INDEX);
        assert_eq!(
            library.resolve(Some(&ContextHandle::new("notes"))).name(),
            "notes"
        );
        assert_eq!(
            library.resolve(Some(&ContextHandle::new("missing"))).name(),
            DEFAULT_INDEX
        );
        assert_eq!(library.index_names(), vec!["default", "notes"]);
    }

    #[tokio::test]
    async fn test_load_dir_missing_folder_uses_fallback() {
        let temp = TempDir::new().unwrap();
        let library = DocumentLibrary::load_dir(temp.path().join("nope"))
            .await
            .unwrap();
        assert_eq!(library.resolve(None).len(), FALLBACK_DOCUMENTS.len());
    }

    #[tokio::test]
    async fn test_load_dir_reads_files_and_subfolders() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("rust.txt"), "Rust has ownership and borrowing.").unwrap();
        std::fs::write(temp.path().join("readme.md"), "Markdown notes about cargo.").unwrap();
        std::fs::write(temp.path().join("image.png"), "not text").unwrap();
        std::fs::create_dir(temp.path().join("policies")).unwrap();
        std::fs::write(
            temp.path().join("policies").join("travel.txt"),
            "Travel expenses need receipts.",
        )
        .unwrap();

        let library = DocumentLibrary::load_dir(temp.path()).await.unwrap();

        assert_eq!(library.index_names(), vec!["default", "policies"]);
        let default = library.resolve(None);
        assert_eq!(default.len(), 2);
        assert_eq!(default.search("ownership", 4).len(), 1);

        let policies = library.resolve(Some(&ContextHandle::new("policies")));
        assert_eq!(policies.search("travel receipts", 4).len(), 1);
        assert!(policies.search("ownership", 4).is_empty());
    }

    #[tokio::test]
    async fn test_load_dir_with_only_subfolders_keeps_fallback_default() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("hr")).unwrap();
        std::fs::write(temp.path().join("hr").join("leave.txt"), "Annual leave is 25 days.")
            .unwrap();

        let library = DocumentLibrary::load_dir(temp.path()).await.unwrap();
        assert_eq!(library.resolve(None).len(), FALLBACK_DOCUMENTS.len());
        assert_eq!(library.index_names(), vec!["default", "hr"]);
    }
}

//! Speech request definitions
//!
//! The request is built once by the caller and never mutated by the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DraftError, DraftResult};

/// A reference document attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedSource {
    /// Display name of the source
    pub name: String,

    /// Raw text content
    pub content: String,

    /// Free-form category (e.g. "policy", "data", "briefing")
    pub kind: String,
}

impl UploadedSource {
    /// Create a new uploaded source
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            kind: kind.into(),
        }
    }
}

/// Input describing the speech to draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Event the speech is given at
    pub occasion: String,

    /// Who the speech is addressed to
    pub audience: String,

    /// Keywords to weave in, in priority order
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Desired tone
    pub tone: String,

    /// Target length in minutes (must be positive)
    pub duration_minutes: u32,

    /// Quotations that must appear
    #[serde(default)]
    pub must_quote: Vec<String>,

    /// Terms that must not appear; first occurrence order is kept
    #[serde(default)]
    pub forbidden_terms: Vec<String>,

    /// Reference material
    #[serde(default)]
    pub references: Vec<UploadedSource>,
}

impl SpeechRequest {
    /// Create a request with the required fields
    pub fn new(
        occasion: impl Into<String>,
        audience: impl Into<String>,
        tone: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            occasion: occasion.into(),
            audience: audience.into(),
            keywords: Vec::new(),
            tone: tone.into(),
            duration_minutes,
            must_quote: Vec::new(),
            forbidden_terms: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Set keywords
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set required quotations
    pub fn with_quotes<I, S>(mut self, quotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.must_quote = quotes.into_iter().map(Into::into).collect();
        self
    }

    /// Set forbidden terms, dropping case-insensitive repeats
    ///
    /// The first spelling of each term is kept.
    pub fn with_forbidden_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_terms.clear();
        for term in terms {
            let term = term.into();
            if !self.is_forbidden(&term) {
                self.forbidden_terms.push(term);
            }
        }
        self
    }

    /// Attach a reference source
    pub fn with_reference(mut self, source: UploadedSource) -> Self {
        self.references.push(source);
        self
    }

    /// Check the request before a session is started
    pub fn validate(&self) -> DraftResult<()> {
        if self.occasion.trim().is_empty() {
            return Err(DraftError::InvalidRequest("occasion is empty".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(DraftError::InvalidRequest("audience is empty".to_string()));
        }
        if self.duration_minutes == 0 {
            return Err(DraftError::InvalidRequest(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if let Some(keyword) = self.keywords.iter().find(|k| self.is_forbidden(k)) {
            return Err(DraftError::InvalidRequest(format!(
                "keyword '{}' is also a forbidden term",
                keyword
            )));
        }
        Ok(())
    }

    /// Whether `term` is on the forbidden list (case-insensitive)
    pub fn is_forbidden(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.forbidden_terms
            .iter()
            .any(|t| t.to_lowercase() == term)
    }

    /// Load a request from a TOML string
    pub fn from_toml(toml_str: &str) -> DraftResult<Self> {
        let request: SpeechRequest = toml::from_str(toml_str)?;
        Ok(request.dedup_forbidden())
    }

    /// Load a request from a JSON string
    pub fn from_json(json: &str) -> DraftResult<Self> {
        let request: SpeechRequest = serde_json::from_str(json)?;
        Ok(request.dedup_forbidden())
    }

    /// Load a request from a file, choosing the format by extension
    pub fn from_file(path: &Path) -> DraftResult<Self> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Sample request used by the demo driver
    pub fn demo() -> Self {
        Self::new(
            "科技创新大会",
            "部委领导与市级代表",
            "庄重而鼓舞人心",
            15,
        )
        .with_keywords(["自主创新", "安全可信", "高质量发展"])
        .with_quotes(["政府工作报告"])
        .with_forbidden_terms(["市场过度化承诺"])
    }

    fn dedup_forbidden(self) -> Self {
        let terms = self.forbidden_terms.clone();
        self.with_forbidden_terms(terms)
    }
}

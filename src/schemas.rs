//! Reflect-and-Revise Schemas
//!
//! Structured output an LLM fills in when answering a question and critiquing its
//! own answer. The schemas carry no validation beyond field presence: the 1-3 query
//! bound and the answer length are instructions to the model, not checks.

use serde::{Deserialize, Serialize};

/// Self-critique of an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    /// Critique of what is missing
    pub missing: String,
    /// Critique of what is superfluous
    pub superfluous: String,
}

/// Initial answer plus critique and follow-up searches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerQuestion {
    /// ~250 word detailed answer to the question
    pub answer: String,
    pub reflection: Reflection,
    /// Search queries for researching improvements (1-3 expected)
    pub search_queries: Vec<String>,
}

/// Revised answer; a flat superset of [`AnswerQuestion`] with citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseAnswer {
    #[serde(flatten)]
    pub draft: AnswerQuestion,
    /// Citations motivating the updated answer
    pub references: Vec<String>,
}

/// Either schema, as produced by one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflexionPayload {
    Answer(AnswerQuestion),
    Revision(ReviseAnswer),
}

impl ReflexionPayload {
    fn draft(&self) -> &AnswerQuestion {
        match self {
            ReflexionPayload::Answer(a) => a,
            ReflexionPayload::Revision(r) => &r.draft,
        }
    }

    pub fn answer(&self) -> &str {
        &self.draft().answer
    }

    pub fn reflection(&self) -> &Reflection {
        &self.draft().reflection
    }

    pub fn search_queries(&self) -> &[String] {
        &self.draft().search_queries
    }

    /// Citations; always empty for an initial answer
    pub fn references(&self) -> &[String] {
        match self {
            ReflexionPayload::Answer(_) => &[],
            ReflexionPayload::Revision(r) => &r.references,
        }
    }
}

// Field descriptions handed to the model alongside the tool definitions.
pub(crate) const MISSING_DESC: &str = "Critique of what is missing.";
pub(crate) const SUPERFLUOUS_DESC: &str = "Critique of what is superfluous";
pub(crate) const ANSWER_DESC: &str = "~250 word detailed answer to the question.";
pub(crate) const REFLECTION_DESC: &str = "Your reflection on the initial answer.";
pub(crate) const SEARCH_QUERIES_DESC: &str =
    "1-3 search queries for researching improvements to address the critique of your current answer.";
pub(crate) const REFERENCES_DESC: &str = "Citations motivating your updated answer.";

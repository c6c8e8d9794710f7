//! Query Classifier
//!
//! Classifies user queries as either:
//! - General: a finance question answered directly by the LLM (e.g., "what is compound interest?")
//! - Portfolio: an investment request handed to the portfolio planner (e.g., "invest my capital")

use std::str::FromStr;

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    General,
    Portfolio,
}

/// Static keyword list — zero allocation
pub const PORTFOLIO_KEYWORDS: &[&str] = &["capital", "invest", "fund", "portfolio", "risk"];

/// Decides which handler a query is routed to
pub trait QueryClassifier: Send + Sync {
    fn classify(&self, query: &str) -> QueryCategory;
}

/// Case-insensitive substring match against [`PORTFOLIO_KEYWORDS`].
///
/// No tokenization: "reinvesting" and "capitalize" both count as portfolio
/// requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl QueryClassifier for KeywordClassifier {
    fn classify(&self, query: &str) -> QueryCategory {
        let lowered = query.to_lowercase();

        if PORTFOLIO_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            QueryCategory::Portfolio
        } else {
            QueryCategory::General
        }
    }
}

/// Matches a keyword only at the start of a word, so "investing" and
/// "funds" match while "reinvesting" and "refund" do not.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordPrefixClassifier;

impl QueryClassifier for WordPrefixClassifier {
    fn classify(&self, query: &str) -> QueryCategory {
        let lowered = query.to_lowercase();

        let hit = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| PORTFOLIO_KEYWORDS.iter().any(|kw| word.starts_with(kw)));

        if hit {
            QueryCategory::Portfolio
        } else {
            QueryCategory::General
        }
    }
}

/// Classifier selection, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    #[default]
    Substring,
    WordPrefix,
}

impl ClassifierKind {
    pub fn build(self) -> Box<dyn QueryClassifier> {
        match self {
            ClassifierKind::Substring => Box::new(KeywordClassifier),
            ClassifierKind::WordPrefix => Box::new(WordPrefixClassifier),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" | "keyword" => Ok(ClassifierKind::Substring),
            "word-prefix" | "word_prefix" | "word" => Ok(ClassifierKind::WordPrefix),
            other => Err(GatewayError::Config(format!(
                "unknown classifier '{}' (expected substring or word-prefix)",
                other
            ))),
        }
    }
}

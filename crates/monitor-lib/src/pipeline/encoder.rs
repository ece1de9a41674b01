//! Label encoding for categorical vitals
//!
//! Wraps the ordered class list a label encoder was fitted with. Unseen
//! categories degrade to the fallback code instead of failing the request.

use tracing::warn;

/// Code substituted for categories absent from the trained vocabulary
pub const FALLBACK_CODE: usize = 0;

/// Ordered set of categories seen during model training
#[derive(Debug, Clone)]
pub struct CategoryVocabulary {
    field: String,
    classes: Vec<String>,
}

impl CategoryVocabulary {
    pub fn new(field: impl Into<String>, classes: Vec<String>) -> Self {
        Self {
            field: field.into(),
            classes,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.classes.iter().any(|c| c == value)
    }

    /// Encode a raw category to its trained integer code.
    ///
    /// Unseen values map to [`FALLBACK_CODE`] with a warning; encoding
    /// never fails.
    pub fn encode(&self, value: &str) -> usize {
        match self.classes.iter().position(|c| c == value) {
            Some(code) => code,
            None => {
                warn!(
                    field = %self.field,
                    value = %value,
                    fallback = %self.classes.get(FALLBACK_CODE).map(String::as_str).unwrap_or(""),
                    "Unseen category, encoding with fallback code"
                );
                FALLBACK_CODE
            }
        }
    }

    /// Decode a trained integer code back to its category label.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

use serde::{Deserialize, Serialize};

use crate::store::SearchResult;

/// Formatting options for the context block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// Prefix each passage with its document id and relevance score.
    pub include_citations: bool,
}

/// Renders retrieved passages into a single context string for prompt
/// injection.
///
/// Passages appear in the order given, blank-line separated. No reordering
/// and no truncation here; cutting the result set is the retriever's job.
/// Identical input sequences always yield identical strings.
#[derive(Debug, Clone, Default)]
pub struct ContextFormatter {
    config: FormatterConfig,
}

impl ContextFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, results: &[SearchResult]) -> String {
        if results.is_empty() {
            return String::new();
        }

        let mut context = String::new();
        for (i, result) in results.iter().enumerate() {
            if self.config.include_citations {
                context.push_str(&format!(
                    "[{}] ({}, relevance: {:.2})\n",
                    i + 1,
                    result.document.id,
                    result.score
                ));
            }
            context.push_str(&result.document.content);
            context.push_str("\n\n");
        }

        context.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::store::DocumentRecord;
    use super::*;

    fn hit(id: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            document: DocumentRecord {
                id: id.to_string(),
                content: content.to_string(),
                metadata: None,
            },
            score,
        }
    }

    #[test]
    fn passages_joined_in_given_order() {
        let formatter = ContextFormatter::default();
        let results = vec![hit("d1", "First passage.", 0.9), hit("d2", "Second passage.", 0.4)];

        let context = formatter.format(&results);
        assert_eq!(context, "First passage.\n\nSecond passage.");
    }

    #[test]
    fn citations_carry_id_and_score() {
        let formatter = ContextFormatter::new(FormatterConfig {
            include_citations: true,
        });
        let context = formatter.format(&[hit("doc-7", "Payload.", 0.875)]);

        assert!(context.contains("[1] (doc-7, relevance: 0.88)"));
        assert!(context.contains("Payload."));
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(ContextFormatter::default().format(&[]), "");
    }

    #[test]
    fn formatting_is_deterministic() {
        let formatter = ContextFormatter::default();
        let results = vec![hit("a", "Alpha.", 0.5), hit("b", "Beta.", 0.3)];
        assert_eq!(formatter.format(&results), formatter.format(&results));
    }
}

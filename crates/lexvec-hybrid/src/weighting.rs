use once_cell::sync::Lazy;
use regex::Regex;

use lexvec_core::config::SearchSettings;

/// `§ 164`, `section 164`, `sec. 164`, `Sec 164`, ...
static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(§|section|sec\.?)\s*\d+").expect("citation pattern"));

pub fn is_citation_query(query: &str) -> bool {
    CITATION.is_match(query)
}

/// Picks the dense/lexical blend weight from the query text.
///
/// Queries that cite a section number lean on literal term matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaSelector {
    pub citation_alpha: f32,
    pub default_alpha: f32,
}

impl Default for AlphaSelector {
    fn default() -> Self {
        Self { citation_alpha: 0.3, default_alpha: 0.5 }
    }
}

impl AlphaSelector {
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self { citation_alpha: settings.citation_alpha, default_alpha: settings.default_alpha }
    }

    pub fn select(&self, query: &str) -> f32 {
        if is_citation_query(query) {
            self.citation_alpha
        } else {
            self.default_alpha
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_pattern_compiles() {
        assert!(Regex::new(CITATION.as_str()).is_ok());
        assert!(is_citation_query("§\u{a0}164"));
    }

    #[test]
    fn citations_prefer_lexical() {
        let selector = AlphaSelector::default();
        for q in ["§ 164", "section 164", "sec. 164", "Section 164", "SEC.164", "what does §164(b) say", "sec 24"] {
            assert_eq!(selector.select(q), 0.3, "query {q:?}");
        }
    }

    #[test]
    fn plain_queries_are_balanced() {
        let selector = AlphaSelector::default();
        for q in ["child tax credit", "SALT deduction limit", "section on retirement", "401k contribution limits"] {
            assert_eq!(selector.select(q), 0.5, "query {q:?}");
        }
    }

    #[test]
    fn weights_follow_settings() {
        let settings = SearchSettings { citation_alpha: 0.1, default_alpha: 0.7, ..SearchSettings::default() };
        let selector = AlphaSelector::from_settings(&settings);
        assert_eq!(selector.select("sec. 1"), 0.1);
        assert_eq!(selector.select("gross income"), 0.7);
    }
}

// Free-text query parsing: price bounds, category, platforms and tags
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::model::{ParsedQuery, ParserError};
use crate::normalizer::normalize_price;
use crate::parser::vocabulary::Vocabulary;

/// Amount token: digits, optional decimal/thousands part, optional k/l suffix.
const AMOUNT: &str = r"[0-9]+(?:[.,][0-9]+)?[kl]?";
const CURRENCY: &str = r"(?:rs\.?|₹|inr)";

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ParserOptions {
    /// Keep each platform code once even when several of its aliases match.
    #[serde(default = "default_dedup_platforms")]
    pub dedup_platforms: bool,
}

fn default_dedup_platforms() -> bool {
    true
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            dedup_platforms: default_dedup_platforms(),
        }
    }
}

pub trait Parser {
    fn parse(&self, query: &str) -> ParsedQuery;
}

/// Rule-ordered heuristic parser. Pure: the same input and vocabulary always
/// yield the same `ParsedQuery`.
pub struct QueryParser {
    vocabulary: Vocabulary,
    options: ParserOptions,
    max_patterns: Vec<Regex>,
    min_patterns: Vec<Regex>,
    range_pattern: Regex,
    loose_amount: Regex,
    unit_suffix: Regex,
    spec_pattern: Regex,
}

impl QueryParser {
    pub fn new(vocabulary: Vocabulary, options: ParserOptions) -> Result<Self, ParserError> {
        let max_patterns = vec![
            Regex::new(&format!(
                r"(?:under|below|less than|max|upto|within|budget|cost)\s*(?:of|is)?\s*{CURRENCY}?\s*({AMOUNT})"
            ))?,
            Regex::new(&format!(r"{CURRENCY}\s*({AMOUNT})\s*(?:max|limit|only)"))?,
        ];
        let min_patterns = vec![Regex::new(&format!(
            r"(?:above|more than|greater than|min|at least|starting|from)\s*(?:from|at)?\s*{CURRENCY}?\s*({AMOUNT})"
        ))?];

        Ok(Self {
            vocabulary,
            options,
            max_patterns,
            min_patterns,
            range_pattern: Regex::new(&format!(r"({AMOUNT})\s*(?:to|-|and)\s*({AMOUNT})"))?,
            loose_amount: Regex::new(&format!(r"(?-u:\b){AMOUNT}(?-u:\b)"))?,
            unit_suffix: Regex::new(r"^\s*(?:gb|mb|tb|mah|mp|hz|v|w|fps|inch)")?,
            spec_pattern: Regex::new(r"(?i)[0-9]+\s*(?:gb|tb|mb|mah|mp|hz|ssd|hdd)(?-u:\b)")?,
        })
    }

    pub fn with_builtin_vocabulary() -> Result<Self, ParserError> {
        Self::new(Vocabulary::builtin(), ParserOptions::default())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn detect_prices(&self, text: &str, parsed: &mut ParsedQuery) {
        // The first pattern that matches decides, even if its amount is unreadable.
        let mut max = first_amount(&self.max_patterns, text);
        let mut min = first_amount(&self.min_patterns, text).unwrap_or(0);

        if is_unset(max) {
            if let Some(caps) = self.range_pattern.captures(text) {
                let a = normalize_price(&caps[1]).unwrap_or(0);
                let b = normalize_price(&caps[2]).unwrap_or(0);
                if a > 0 && b > 0 {
                    debug!("range detected: {} .. {}", a, b);
                    min = a.min(b);
                    max = Some(a.max(b));
                }
            }
        }

        // Also fires after an explicit minimum of 0.
        if is_unset(max) && min == 0 {
            let candidates = self.loose_amounts(text);
            debug!("loose price candidates: {:?}", candidates);
            match candidates.as_slice() {
                [] => {}
                [only] => max = Some(*only),
                many => {
                    min = many.iter().copied().min().unwrap_or(0);
                    max = many.iter().copied().max();
                }
            }
        }

        let mut max = max.filter(|m| *m > 0);
        if let Some(upper) = max {
            if upper < min {
                max = Some(min);
                min = upper;
            }
        }

        parsed.min_price = min;
        parsed.max_price = max;
    }

    /// Standalone amounts that are not technical specs ("16gb", "5000 mah").
    fn loose_amounts(&self, text: &str) -> Vec<u64> {
        let mut found = Vec::new();
        for m in self.loose_amount.find_iter(text) {
            let token = m.as_str();
            if self.unit_suffix.is_match(&text[m.end()..]) {
                // "1200.5 w" still yields its integer head "1200".
                if let Some(pos) = token.find(['.', ',']) {
                    push_if_price(&token[..pos], &mut found);
                }
                continue;
            }
            push_if_price(token, &mut found);
        }
        found
    }

    fn detect_category(&self, text: &str, parsed: &mut ParsedQuery) {
        let hit = self
            .vocabulary
            .categories()
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()));
        if let Some((keyword, category)) = hit {
            debug!("category '{}' via keyword '{}'", category, keyword);
            parsed.category = Some(category.clone());
            parsed.push_tag(keyword.clone());
        }
    }

    fn detect_platforms(&self, text: &str, parsed: &mut ParsedQuery) {
        for (alias, code) in self.vocabulary.platforms() {
            if !text.contains(alias.as_str()) {
                continue;
            }
            if self.options.dedup_platforms && parsed.platforms.contains(code) {
                continue;
            }
            parsed.platforms.push(code.clone());
        }
    }

    fn extract_spec_tags(&self, original: &str, parsed: &mut ParsedQuery) {
        for m in self.spec_pattern.find_iter(original) {
            let spec: String = m
                .as_str()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            parsed.push_tag(spec);
        }
    }

    fn extract_word_tags(&self, text: &str, parsed: &mut ParsedQuery) {
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
            .collect();
        for word in cleaned.split_whitespace() {
            if word.len() <= 2
                || self.vocabulary.is_stopword(word)
                || word.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }
            parsed.push_tag(word);
        }
    }
}

impl Parser for QueryParser {
    fn parse(&self, query: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::new(query);
        let lower = query.to_lowercase();

        self.detect_prices(&lower, &mut parsed);
        self.detect_category(&lower, &mut parsed);
        self.detect_platforms(&lower, &mut parsed);
        self.extract_spec_tags(query, &mut parsed);
        self.extract_word_tags(&lower, &mut parsed);

        debug!(
            "parsed '{}': category={:?} min={} max={:?} platforms={:?} tags={:?}",
            query, parsed.category, parsed.min_price, parsed.max_price, parsed.platforms, parsed.tags
        );
        parsed
    }
}

fn first_amount(patterns: &[Regex], text: &str) -> Option<u64> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| normalize_price(&caps[1]))
}

/// A missing or zero maximum counts as "no maximum".
fn is_unset(max: Option<u64>) -> bool {
    max.unwrap_or(0) == 0
}

/// Prices are usually above 500 ("iphone 14" is a model number), unless the
/// token carries an explicit k/l magnitude.
fn push_if_price(token: &str, found: &mut Vec<u64>) {
    if let Some(value) = normalize_price(token) {
        if value > 0 && (value > 500 || token.contains('k') || token.contains('l')) {
            found.push(value);
        }
    }
}

//! Text analysis for text and contact clauses.

use crate::operation::FullTextTerm;

/// Lucene's English stop set.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Fields whose values are whole email addresses.
const ADDRESS_FIELDS: &[&str] = &["from", "to", "cc"];

/// Turns clause text into index terms for a field.
pub trait Analyzer: Send + Sync {
    fn tokenize(&self, field: &str, text: &str) -> Vec<String>;
}

/// Default analyzer.
///
/// Lowercases, splits on punctuation, and drops English stop words. Address
/// fields keep `foo@bar.com` and `first_last` intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAnalyzer;

impl Analyzer for StandardAnalyzer {
    fn tokenize(&self, field: &str, text: &str) -> Vec<String> {
        let address = ADDRESS_FIELDS.contains(&field);
        let normalized = normalize_width(text).to_lowercase();

        normalized
            .split(|c: char| !is_token_char(c, address))
            .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '-' | '\'')))
            .filter(|t| !t.is_empty())
            .filter(|t| address || !STOP_WORDS.contains(t))
            .map(str::to_string)
            .collect()
    }
}

fn is_token_char(c: char, address: bool) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '-' | '\'' | '*') || (address && c == '_')
}

/// Fold fullwidth ASCII variants and the ideographic space to ASCII.
pub fn normalize_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn is_address_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | '<' | '>' | '"' | '(' | ')')
}

/// Tokenize contact search text.
///
/// Trailing `*` markers are stripped; tokens left empty are dropped.
pub fn contact_tokens(text: &str) -> Vec<String> {
    normalize_width(text)
        .split(is_address_boundary)
        .map(|t| t.to_lowercase())
        .map(|t| t.trim_end_matches('*').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Index term for a contact token list.
///
/// No tokens match nothing, one token is a prefix, more form a phrase whose
/// last word is open.
pub fn contact_term(tokens: &[String]) -> FullTextTerm {
    match tokens {
        [] => FullTextTerm::NoOp,
        [only] => FullTextTerm::Prefix(only.clone()),
        _ => FullTextTerm::Phrase {
            terms: tokens.to_vec(),
            last_is_prefix: true,
        },
    }
}

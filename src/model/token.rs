//! Resolution of token mint addresses to human-readable symbols.

use crate::{utils, Result};
use std::collections::HashMap;
use std::path::Path;

/// Number of leading mint characters kept in the placeholder for an unknown token.
const PLACEHOLDER_CHARS: usize = 8;

const DEFAULT_TOKENS: &[(&str, &str)] = &[
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
    ("7cFh3fT6yXSSBqeVqSQm4YS8KUiwopGLErB9WwG4pump", "UNKNOWN_TOKEN"),
    ("So11111111111111111111111111111111111111112", "SOL"),
];

/// Maps mint addresses to symbols.
///
/// The registry is built once, before parsing starts, and is read-only afterwards. Lookups never
/// fail: an unknown mint resolves to a truncated placeholder such as `abcdefgh...`. Use
/// `is_known` to find out whether a placeholder was produced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenRegistry {
    symbols: HashMap<String, String>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_TOKENS
                .iter()
                .map(|(mint, symbol)| (mint.to_string(), symbol.to_string()))
                .collect(),
        }
    }
}

impl TokenRegistry {
    /// Creates a registry holding the built-in defaults overlaid with `overrides`. On a key
    /// collision the override wins.
    pub fn with_overrides(overrides: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut registry = Self::default();
        registry.symbols.extend(overrides);
        registry
    }

    /// Loads a flat JSON object of `mint -> symbol` from `path` and overlays it on the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let overrides: HashMap<String, String> = utils::deserialize(path).await?;
        Ok(Self::with_overrides(overrides))
    }

    /// Returns the symbol for `mint`, or the placeholder when the mint is unknown.
    pub fn symbol(&self, mint: &str) -> String {
        match self.symbols.get(mint) {
            Some(symbol) => symbol.clone(),
            None => placeholder(mint),
        }
    }

    pub fn is_known(&self, mint: &str) -> bool {
        self.symbols.contains_key(mint)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn placeholder(mint: &str) -> String {
    let head: String = mint.chars().take(PLACEHOLDER_CHARS).collect();
    format!("{head}...")
}

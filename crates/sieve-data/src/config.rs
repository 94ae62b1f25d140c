// Configuration for DataSource and per-call transform options

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::repr::DEFAULT_REPR_ITEMS;

/// How `decode` treats a tuple whose length differs from the branch count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeLength {
    /// Reject the tuple with `Error::BranchCountMismatch`.
    #[default]
    Strict,
    /// Decode the common prefix and drop the rest.
    Truncate,
}

/// Configuration for a [`DataSource`](crate::source::DataSource).
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Length policy for decoding per-branch tuples.
    pub decode_length: DecodeLength,
    /// Number of elements shown by `describe` before eliding the rest.
    pub repr_items: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            decode_length: DecodeLength::Strict,
            repr_items: DEFAULT_REPR_ITEMS,
        }
    }
}

impl SourceConfig {
    pub fn decode_length(mut self, d: DecodeLength) -> Self {
        self.decode_length = d;
        self
    }

    pub fn repr_items(mut self, n: usize) -> Self {
        self.repr_items = n;
        self
    }
}

/// Free-form options threaded unchanged through `apply`, `decode` and `show`.
///
/// Keys and values are strings; transforms parse what they understand and
/// ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The value under `key` parsed as `V`, or `None` if absent or unparsable.
    pub fn parse<V: FromStr>(&self, key: &str) -> Option<V> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let cfg = SourceConfig::default()
            .decode_length(DecodeLength::Truncate)
            .repr_items(3);
        assert_eq!(cfg.decode_length, DecodeLength::Truncate);
        assert_eq!(cfg.repr_items, 3);
        assert_eq!(SourceConfig::default().repr_items, 10);
    }

    #[test]
    fn options_parse() {
        let opts = Options::new().with("precision", 3).with("title", "batch");
        assert_eq!(opts.parse::<usize>("precision"), Some(3));
        assert_eq!(opts.get("title"), Some("batch"));
        assert_eq!(opts.parse::<usize>("title"), None);
        assert!(Options::new().is_empty());
    }
}

//! Wildcard key patterns for client-side invalidation
//!
//! The memory tier evaluates invalidation patterns locally: a `*` in the
//! pattern matches any substring of a key, everything else matches
//! literally. The remote store is handed the raw pattern string and applies
//! its own glob dialect, so the two matchers are deliberately separate.

use regex::Regex;

/// A compiled wildcard pattern over cache keys
///
/// `*` matches any substring (including the empty one); all other
/// characters match literally. The whole key must match.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    /// Compile a wildcard pattern into a key matcher
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for (i, segment) in pattern.split('*').enumerate() {
            if i > 0 {
                source.push_str(".*");
            }
            source.push_str(&regex::escape(segment));
        }
        source.push('$');

        Ok(Self {
            regex: Regex::new(&source)?,
        })
    }

    /// Check whether a key matches this pattern
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Clone of the underlying matcher, for use in `'static` predicates
    pub(crate) fn matcher(&self) -> Regex {
        self.regex.clone()
    }
}

//! Safe-mode keyword filtering
//!
//! Items carry optional `keywords` metadata from their source. When safe mode is
//! on, any keyword on the denylist rejects the item. Items without keywords are
//! never rejected: the filter fails open.

use crate::types::{Metadata, metadata_keys};
use std::collections::{BTreeSet, HashSet};

/// Tags that cover most not-fully-safe images on common wallpaper sources
pub const SAFE_MODE_DENYLIST: &[&str] = &[
    "woman", "women", "model", "models", "boob", "boobs", "tit", "tits",
    "lingerie", "bikini", "bikini model", "sexy", "bra", "bras", "panties",
    "face", "faces", "legs", "feet", "pussy",
    "ass", "asses", "topless", "long hair", "lesbians", "cleavage",
    "brunette", "brunettes", "redhead", "redheads", "blonde", "blondes",
    "high heels", "miniskirt", "stockings", "anime girls", "in bed", "kneeling",
    "girl", "girls", "nude", "naked", "people", "fuck", "sex",
];

/// Classification of one item
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Safety {
    /// The item may be downloaded
    Safe,
    /// The item hit the denylist
    Unsafe {
        /// Lower-cased keywords that matched
        matched: BTreeSet<String>,
    },
}

impl Safety {
    /// Whether the item may be downloaded
    pub fn is_safe(&self) -> bool {
        matches!(self, Safety::Safe)
    }
}

/// Keyword denylist filter
#[derive(Clone, Debug)]
pub struct SafetyFilter {
    denylist: HashSet<String>,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::with_terms(SAFE_MODE_DENYLIST.iter().copied())
    }
}

impl SafetyFilter {
    /// Build a filter from a custom term list (terms are lower-cased)
    pub fn with_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    /// Classify an item by its `keywords` metadata
    ///
    /// Only active when `safe_mode` is on and `keywords` is an array; non-string
    /// entries in the array are ignored.
    pub fn classify(&self, safe_mode: bool, extra_metadata: &Metadata) -> Safety {
        if !safe_mode {
            return Safety::Safe;
        }

        let Some(keywords) = extra_metadata
            .get(metadata_keys::KEYWORDS)
            .and_then(|v| v.as_array())
        else {
            return Safety::Safe;
        };

        let matched: BTreeSet<String> = keywords
            .iter()
            .filter_map(|k| k.as_str())
            .map(str::to_lowercase)
            .filter(|k| self.denylist.contains(k))
            .collect();

        if matched.is_empty() {
            Safety::Safe
        } else {
            Safety::Unsafe { matched }
        }
    }
}

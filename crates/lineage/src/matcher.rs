//! Exact-name matching of assets across two tiers.
//!
//! Matching is by name only, compared case-insensitively; the stored names
//! are preserved on whatever edges get created from a match. There is no
//! fuzzy matching. Duplicate names within one collection are undefined
//! behavior; the last occurrence wins, and nothing downstream relies on
//! which duplicate survives.

use metabridge_catalog_client::{Column, Table};
use std::collections::HashMap;

/// Anything matchable by display name.
pub trait NamedAsset {
    fn asset_name(&self) -> &str;
}

impl NamedAsset for Table {
    fn asset_name(&self) -> &str {
        &self.name
    }
}

impl NamedAsset for Column {
    fn asset_name(&self) -> &str {
        &self.name
    }
}

/// A source/target pair with equal names.
#[derive(Debug)]
pub struct MatchedPair<'a, T> {
    pub source: &'a T,
    pub target: &'a T,
}

/// Result of matching one source collection against one target collection.
#[derive(Debug)]
pub struct MatchOutcome<'a, T> {
    /// Pairs with equal names, in source order
    pub pairs: Vec<MatchedPair<'a, T>>,
    /// Source assets with no name match on the target side
    pub unmatched_source: Vec<&'a T>,
}

/// Pair up source and target assets whose names are equal.
///
/// Unmatched source assets are reported; unmatched target assets are simply
/// never paired.
pub fn match_by_name<'a, T: NamedAsset>(source: &'a [T], target: &'a [T]) -> MatchOutcome<'a, T> {
    let target_by_name: HashMap<String, &T> = target
        .iter()
        .map(|t| (fold_name(t.asset_name()), t))
        .collect();

    let mut pairs = Vec::new();
    let mut unmatched_source = Vec::new();

    for s in dedupe_last_wins(source) {
        match target_by_name.get(&fold_name(s.asset_name())) {
            Some(t) => pairs.push(MatchedPair { source: s, target: *t }),
            None => unmatched_source.push(s),
        }
    }

    MatchOutcome {
        pairs,
        unmatched_source,
    }
}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Collapse duplicate names, keeping the position of the first occurrence
/// and the value of the last.
fn dedupe_last_wins<'a, T: NamedAsset>(items: &'a [T]) -> Vec<&'a T> {
    let mut order: Vec<&T> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = fold_name(item.asset_name());
        match index.get(&key) {
            Some(&i) => order[i] = item,
            None => {
                index.insert(key, order.len());
                order.push(item);
            }
        }
    }

    order
}

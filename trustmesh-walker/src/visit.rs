//! Per-call-tree visitation state
//!
//! Tracks which identities are currently being resolved (to cut cycles) and
//! the trust multipliers already computed within the call tree.
//!
//! A multiplier depends on which of the identities its resolution visited
//! were on the resolution path at the time, since those were cut as cycles.
//! Each memo entry keeps that slice of the path and is reused only where the
//! same slice is active, so a cached value always equals a fresh resolution.

use std::collections::{HashMap, HashSet};

/// Memoized trust for one identity
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrust {
    /// Remaining depth the multiplier was computed with
    pub depth: u32,
    /// Multiplier in `[0, 1]`
    pub multiplier: f64,
    /// Identities the resolution visited, the identity itself included
    pub visited: HashSet<String>,
    /// Members of `visited` that were further up the path when recorded
    pub context: HashSet<String>,
}

/// Active set and memo for one top-level scoring call
#[derive(Debug, Default)]
pub struct VisitCache {
    active: HashSet<String>,
    memo: HashMap<String, Vec<ResolvedTrust>>,
    resolved: HashSet<String>,
}

impl VisitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `identity` as in progress; false if it already was
    pub fn enter(&mut self, identity: &str) -> bool {
        self.active.insert(identity.to_string())
    }

    pub fn leave(&mut self, identity: &str) {
        self.active.remove(identity);
    }

    pub fn is_active(&self, identity: &str) -> bool {
        self.active.contains(identity)
    }

    /// Cached resolution of `identity` at exactly `depth` that holds on the current path
    pub fn lookup(&self, identity: &str, depth: u32) -> Option<&ResolvedTrust> {
        self.memo.get(identity)?.iter().find(|entry| {
            entry.depth == depth
                && entry
                    .visited
                    .iter()
                    .all(|id| self.active.contains(id) == entry.context.contains(id))
        })
    }

    /// Record a resolution of `identity`; call after leaving it
    pub fn record(
        &mut self,
        identity: &str,
        depth: u32,
        multiplier: f64,
        visited: HashSet<String>,
    ) {
        let context = visited
            .iter()
            .filter(|id| self.active.contains(id.as_str()))
            .cloned()
            .collect();

        self.memo
            .entry(identity.to_string())
            .or_default()
            .push(ResolvedTrust {
                depth,
                multiplier,
                visited,
                context,
            });
    }

    /// Note that `identity`'s attestations were fetched and walked
    pub fn mark_resolved(&mut self, identity: &str) {
        self.resolved.insert(identity.to_string());
    }

    /// Distinct identities walked with a successful fetch
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Memo entries across all identities
    pub fn memo_len(&self) -> usize {
        self.memo.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_active_set() {
        let mut visits = VisitCache::new();
        assert!(visits.enter("alice"));
        assert!(!visits.enter("alice"));
        assert!(visits.is_active("alice"));

        visits.leave("alice");
        assert!(!visits.is_active("alice"));
    }

    #[test]
    fn test_lookup_requires_exact_depth() {
        let mut visits = VisitCache::new();
        visits.record("alice", 2, 0.6, set(&["alice"]));

        assert_eq!(visits.lookup("alice", 2).map(|e| e.multiplier), Some(0.6));
        assert!(visits.lookup("alice", 1).is_none());
        assert!(visits.lookup("alice", 3).is_none());
        assert!(visits.lookup("bob", 2).is_none());
    }

    #[test]
    fn test_entry_cut_against_path_stays_on_that_path() {
        let mut visits = VisitCache::new();
        visits.enter("root");
        visits.enter("a");
        // w was resolved under a and reached it
        visits.record("w", 1, 0.25, set(&["w", "a"]));
        assert_eq!(visits.lookup("w", 1).map(|e| e.multiplier), Some(0.25));

        visits.leave("a");
        assert!(visits.lookup("w", 1).is_none());

        visits.enter("b");
        assert!(visits.lookup("w", 1).is_none());
        visits.record("w", 1, 0.35, set(&["w", "a"]));
        assert_eq!(visits.lookup("w", 1).map(|e| e.multiplier), Some(0.35));

        visits.leave("b");
        visits.enter("a");
        assert_eq!(visits.lookup("w", 1).map(|e| e.multiplier), Some(0.25));
        assert_eq!(visits.memo_len(), 2);
    }

    #[test]
    fn test_entry_ignores_unrelated_path() {
        let mut visits = VisitCache::new();
        visits.enter("root");
        visits.record("c", 0, 0.25, set(&["c"]));

        visits.enter("x");
        visits.enter("y");
        assert_eq!(visits.lookup("c", 0).map(|e| e.multiplier), Some(0.25));
    }

    #[test]
    fn test_resolved_count_is_distinct() {
        let mut visits = VisitCache::new();
        visits.mark_resolved("alice");
        visits.mark_resolved("bob");
        visits.mark_resolved("alice");
        assert_eq!(visits.resolved_count(), 2);
    }
}

//! Blocking-dependency queries: what can be worked on, what is in the way.
//!
//! These read issue data directly, so they stay exact even when Phase 2 is
//! still running. A dependency on an unknown issue never blocks, and an
//! issue listing itself as a blocker is ignored (the graph drops
//! self-loops too).

use std::collections::{HashSet, VecDeque};

use blockade_core::{Issue, Status};
use serde::Serialize;

use super::Analyzer;

/// One issue on the path from a target to the work that unblocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerChainEntry {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: i32,
    /// 0 for the target, 1 for a direct blocker, and so on.
    pub depth: usize,
    /// No open blockers of its own.
    pub is_root: bool,
    /// Open and not blocked; same test as [`Analyzer::actionable_issues`].
    pub actionable: bool,
    /// Open issues directly blocked by this one.
    pub blocks_count: usize,
}

/// Why an issue is blocked, traced back to the root blockers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerChain {
    pub target_id: String,
    pub is_blocked: bool,
    /// Chain entries excluding the target itself.
    pub chain_length: usize,
    /// Sorted by priority, then id.
    pub root_blockers: Vec<BlockerChainEntry>,
    /// Breadth-first from the target.
    pub chain: Vec<BlockerChainEntry>,
    pub has_cycle: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle_ids: Vec<String>,
}

impl Analyzer {
    /// Open issues with no open blocker, sorted by id.
    #[must_use]
    pub fn actionable_issues(&self) -> Vec<&Issue> {
        let mut out: Vec<&Issue> = self
            .issues
            .iter()
            .filter(|issue| !issue.status.is_closed_like())
            .filter(|issue| self.open_blocker_ids(issue).next().is_none())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Existing blocking targets of `id`, in declaration order.
    ///
    /// Empty when `id` is unknown.
    #[must_use]
    pub fn blockers(&self, id: &str) -> Vec<&str> {
        self.issue(id)
            .map(|issue| self.blocker_ids(issue).collect())
            .unwrap_or_default()
    }

    /// Like [`Self::blockers`], keeping only targets that are not closed.
    #[must_use]
    pub fn open_blockers(&self, id: &str) -> Vec<&str> {
        self.issue(id)
            .map(|issue| self.open_blocker_ids(issue).collect())
            .unwrap_or_default()
    }

    /// Open issues that have a blocking dependency on `id`.
    #[must_use]
    pub fn count_blocked_by(&self, id: &str) -> usize {
        self.graph.node_index(id).map_or(0, |idx| {
            self.graph
                .dependents_of(idx)
                .iter()
                .filter(|&&dependent| {
                    self.issues
                        .get(dependent)
                        .is_some_and(|issue| !issue.status.is_closed_like())
                })
                .count()
        })
    }

    /// Open dependents that would become actionable if `id` closed.
    ///
    /// A dependent qualifies when `id` is its only open blocker. Sorted.
    #[must_use]
    pub fn unblocks(&self, id: &str) -> Vec<String> {
        let Some(idx) = self.graph.node_index(id) else {
            return Vec::new();
        };
        if self.issues.get(idx).is_some_and(|issue| issue.status.is_closed_like()) {
            return Vec::new();
        }

        let mut out: Vec<String> = self
            .graph
            .dependents_of(idx)
            .iter()
            .filter_map(|&dependent| self.issues.get(dependent))
            .filter(|issue| !issue.status.is_closed_like())
            .filter(|issue| self.open_blocker_ids(issue).all(|blocker| blocker == id))
            .map(|issue| issue.id.clone())
            .collect();
        out.sort_unstable();
        out
    }

    /// Trace why `id` is blocked, breadth-first over open blockers.
    ///
    /// Returns `None` when `id` is unknown.
    #[must_use]
    pub fn blocker_chain(&self, id: &str) -> Option<BlockerChain> {
        let target = self.issue(id)?;
        let direct: Vec<&str> = self.open_blocker_ids(target).collect();

        let mut result = BlockerChain {
            target_id: target.id.clone(),
            is_blocked: !direct.is_empty(),
            chain_length: 0,
            root_blockers: Vec::new(),
            chain: vec![self.chain_entry(target, 0, direct.is_empty())],
            has_cycle: false,
            cycle_ids: Vec::new(),
        };
        if direct.is_empty() {
            return Some(result);
        }

        let mut visited: HashSet<&str> = HashSet::from([target.id.as_str()]);
        let mut queue: VecDeque<(&str, usize)> = direct.into_iter().map(|b| (b, 1)).collect();

        while let Some((blocker_id, depth)) = queue.pop_front() {
            if !visited.insert(blocker_id) {
                result.has_cycle = true;
                result.cycle_ids.push(blocker_id.to_string());
                continue;
            }
            let Some(blocker) = self.issue(blocker_id) else {
                continue;
            };

            let next: Vec<&str> = self.open_blocker_ids(blocker).collect();
            let entry = self.chain_entry(blocker, depth, next.is_empty());
            if entry.is_root {
                result.root_blockers.push(entry.clone());
            } else {
                queue.extend(next.into_iter().map(|b| (b, depth + 1)));
            }
            result.chain.push(entry);
        }

        result.chain_length = result.chain.len() - 1;
        result
            .root_blockers
            .sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Some(result)
    }

    fn chain_entry(&self, issue: &Issue, depth: usize, is_root: bool) -> BlockerChainEntry {
        BlockerChainEntry {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status,
            priority: issue.priority,
            depth,
            is_root,
            actionable: is_root && !issue.status.is_closed_like(),
            blocks_count: self.count_blocked_by(&issue.id),
        }
    }

    /// Existing, distinct, non-self blocking targets of `issue`.
    fn blocker_ids<'a>(&'a self, issue: &'a Issue) -> impl Iterator<Item = &'a str> + 'a {
        let mut seen = HashSet::new();
        issue
            .blocking_targets()
            .filter(move |&target| target != issue.id && self.graph.node_index(target).is_some())
            .filter(move |&target| seen.insert(target))
    }

    fn open_blocker_ids<'a>(&'a self, issue: &'a Issue) -> impl Iterator<Item = &'a str> + 'a {
        self.blocker_ids(issue)
            .filter(move |&target| self.issue(target).is_some_and(|b| !b.status.is_closed_like()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

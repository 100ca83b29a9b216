//! Binding merge with conflict detection
//!
//! Merges a mod's candidate keys into the keys already present in a target
//! `input.settings` file. Exact duplicates are ignored, new bindings are
//! added, and bindings that clash with an existing one are handed to a
//! `ConflictResolver` for a decision.
//!
//! # Conflicts
//! A candidate conflicts with an existing binding of the same context when
//! both bind the same logical action (`Action=` field) and either
//! - they use different physical keys on the same device (rebind), or
//! - they use the same physical key with different fields (modifiers).
//!
//! Candidates of one merge call are only compared against the keys that
//! were in the target before the call, never against each other; a mod may
//! bind one action to several keys.
//!
//! # Phases
//! 1. Scanning: duplicates are skipped, clean candidates added, conflicts
//!    deferred so the resolver sees every clash against the original state
//! 2. Resolving: each deferred clash goes to the resolver (or to the
//!    sticky "to all" answer given earlier in the same call)
//! 3. Finalizing: the working set is sorted by the `Key` order

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::core::types::{Key, ACTION_FIELD};

/// Answer to a single conflict
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Resolution {
    /// Replace the existing binding with the incoming one
    Accept,
    /// Keep the existing binding, drop the incoming one
    Reject,
    /// Accept this and every later conflict of the same merge
    AcceptAll,
    /// Reject this and every later conflict of the same merge
    RejectAll,
}

/// Decides conflicts during a merge.
///
/// Implementations may block (for instance to ask a person); the engine
/// calls `decide` synchronously, once per conflicting pair, and keeps no
/// state between calls other than a sticky "to all" answer.
pub trait ConflictResolver {
    /// * `existing` - The binding already in the target file
    /// * `incoming` - The mod's binding that clashes with it
    /// * `context` - Section both bindings live in
    /// * `just_modifiers` - True when both use the same physical key and
    ///   only the other fields differ
    fn decide(
        &mut self,
        existing: &Key,
        incoming: &Key,
        context: &str,
        just_modifiers: bool,
    ) -> Resolution;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&Key, &Key, &str, bool) -> Resolution,
{
    fn decide(&mut self, existing: &Key, incoming: &Key, context: &str, just_modifiers: bool) -> Resolution {
        self(existing, incoming, context, just_modifiers)
    }
}

/// Resolver that gives the same answer to every conflict.
#[derive(Clone, Copy, Debug)]
pub struct FixedResolver(pub Resolution);

impl ConflictResolver for FixedResolver {
    fn decide(&mut self, _: &Key, _: &Key, _: &str, _: bool) -> Resolution {
        self.0
    }
}

/// A candidate together with the existing bindings it clashes with.
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub incoming: Key,
    pub conflicting: Vec<Key>,
}

/// Result of one merge call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeOutcome {
    /// Final key set, sorted
    pub keys: Vec<Key>,
    /// Candidates added, including accepted replacements
    pub added: usize,
    /// Conflicts rejected
    pub skipped: usize,
}

/// Returns true if `incoming` clashes with `existing`.
///
/// Placeholders and version markers never conflict. The relation is
/// symmetric.
pub fn is_conflict(existing: &Key, incoming: &Key) -> bool {
    let (Some(existing_action), Some(incoming_action)) = (existing.action(), incoming.action())
    else {
        return false;
    };

    existing.context == incoming.context
        && existing_action.get(ACTION_FIELD) == incoming_action.get(ACTION_FIELD)
        && ((existing.device() == incoming.device() && existing.raw_key() != incoming.raw_key())
            || (existing.raw_key() == incoming.raw_key() && existing_action != incoming_action))
}

/// Merges candidate keys into an existing key set.
///
/// Holds the working set for the duration of one merge.
pub struct MergeEngine {
    working: Vec<Key>,
    /// Length of the prefix of `working` that came from the target file
    original_len: usize,
    added: usize,
    skipped: usize,
}

impl MergeEngine {
    /// Creates an engine over the keys already in the target file.
    pub fn new(existing: Vec<Key>) -> Self {
        let original_len = existing.len();
        Self {
            working: existing,
            original_len,
            added: 0,
            skipped: 0,
        }
    }

    /// Runs a complete merge.
    ///
    /// # Example
    /// ```
    /// use modbinds::core::conflict::{FixedResolver, MergeEngine, Resolution};
    /// use modbinds::core::types::Key;
    ///
    /// let existing = vec![Key::binding("[Movement]", "IK_W", "Action=Forward")];
    /// let candidates = vec![Key::binding("[Movement]", "IK_Up", "Action=Forward")];
    ///
    /// let mut resolver = FixedResolver(Resolution::Accept);
    /// let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);
    /// assert_eq!((outcome.added, outcome.skipped), (1, 0));
    /// assert_eq!(outcome.keys, candidates);
    /// ```
    pub fn merge(
        existing: Vec<Key>,
        candidates: &[Key],
        resolver: &mut dyn ConflictResolver,
    ) -> MergeOutcome {
        let span = info_span!("merge", existing = existing.len(), candidates = candidates.len());
        let _guard = span.enter();

        let mut engine = Self::new(existing);
        let conflicts = engine.scan(candidates);
        engine.resolve(&conflicts, resolver);
        engine.finish()
    }

    /// First pass: adds clean candidates and returns the deferred conflicts.
    pub fn scan(&mut self, candidates: &[Key]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for candidate in candidates {
            if self.working.contains(candidate)
                || conflicts.iter().any(|c: &Conflict| c.incoming == *candidate)
            {
                continue;
            }

            let conflicting: Vec<Key> = self.working[..self.original_len]
                .iter()
                .filter(|existing| is_conflict(existing, candidate))
                .cloned()
                .collect();

            if conflicting.is_empty() {
                self.working.push(candidate.clone());
                self.added += 1;
            } else {
                debug!(key = %candidate, context = %candidate.context, clashes = conflicting.len(), "conflict deferred");
                conflicts.push(Conflict {
                    incoming: candidate.clone(),
                    conflicting,
                });
            }
        }

        conflicts
    }

    /// Second pass: asks the resolver about every deferred conflict.
    pub fn resolve(&mut self, conflicts: &[Conflict], resolver: &mut dyn ConflictResolver) {
        let mut sticky: Option<Resolution> = None;

        for conflict in conflicts {
            let incoming = &conflict.incoming;

            for existing in &conflict.conflicting {
                let just_modifiers = existing.raw_key() == incoming.raw_key();

                let answer = match sticky {
                    Some(answer) => answer,
                    None => resolver.decide(existing, incoming, &incoming.context, just_modifiers),
                };

                match answer {
                    Resolution::Accept => self.replace(existing, incoming),
                    Resolution::Reject => self.skipped += 1,
                    Resolution::AcceptAll => {
                        self.replace(existing, incoming);
                        sticky = Some(Resolution::Accept);
                    }
                    Resolution::RejectAll => {
                        self.skipped += 1;
                        sticky = Some(Resolution::Reject);
                    }
                }
            }
        }
    }

    /// Sorts the working set and returns the outcome.
    pub fn finish(mut self) -> MergeOutcome {
        self.working.sort();
        info!(added = self.added, skipped = self.skipped, total = self.working.len(), "merge finished");

        MergeOutcome {
            keys: self.working,
            added: self.added,
            skipped: self.skipped,
        }
    }

    fn replace(&mut self, existing: &Key, incoming: &Key) {
        if let Some(index) = self.working.iter().position(|key| key == existing) {
            self.working.remove(index);
            if index < self.original_len {
                self.original_len -= 1;
            }
        }
        if !self.working.contains(incoming) {
            self.working.push(incoming.clone());
        }
        self.added += 1;
    }
}

/// Removes a mod's bindings from a key set.
///
/// Only exact binding matches are removed; placeholders and version
/// markers stay so shared sections keep their shape. A section left with
/// no entries gets a placeholder, so its header survives the rewrite.
/// Returns the remaining keys (sorted) and the number of bindings removed.
pub fn remove_keys(existing: Vec<Key>, installed: &[Key]) -> (Vec<Key>, usize) {
    let before = existing.len();
    let mut contexts: Vec<String> = existing.iter().map(|key| key.context.clone()).collect();
    contexts.dedup();

    let mut remaining: Vec<Key> = existing
        .into_iter()
        .filter(|key| !(key.is_binding() && installed.contains(key)))
        .collect();
    let removed = before - remaining.len();

    for context in contexts {
        if !remaining.iter().any(|key| key.context == context) {
            remaining.push(Key::placeholder(&context));
        }
    }
    remaining.sort();
    remaining.dedup();

    debug!(removed, "removed mod bindings");
    (remaining, removed)
}

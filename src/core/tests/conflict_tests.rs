use crate::core::conflict::{
    is_conflict, remove_keys, ConflictResolver, FixedResolver, MergeEngine, Resolution,
};
use crate::core::types::Key;

/// Resolver that replays scripted answers and records every call
struct ScriptedResolver {
    answers: Vec<Resolution>,
    calls: Vec<(Key, Key, String, bool)>,
}

impl ScriptedResolver {
    fn new(answers: Vec<Resolution>) -> Self {
        Self {
            answers,
            calls: Vec::new(),
        }
    }
}

impl ConflictResolver for ScriptedResolver {
    fn decide(&mut self, existing: &Key, incoming: &Key, context: &str, just_modifiers: bool) -> Resolution {
        self.calls
            .push((existing.clone(), incoming.clone(), context.to_string(), just_modifiers));
        let index = self.calls.len() - 1;
        self.answers[index.min(self.answers.len() - 1)]
    }
}

fn movement(raw_key: &str, action: &str) -> Key {
    Key::binding("[Movement]", raw_key, action)
}

#[test]
fn test_merge_without_conflicts() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_E", "Action=Use")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Reject]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(
        outcome.keys,
        vec![movement("IK_E", "Action=Use"), movement("IK_W", "Action=Forward")]
    );
    assert!(resolver.calls.is_empty());
}

#[test]
fn test_rebind_conflict_accepted() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_Up", "Action=Forward")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Accept]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(outcome.keys, vec![movement("IK_Up", "Action=Forward")]);
    assert_eq!((outcome.added, outcome.skipped), (1, 0));

    let (existing, incoming, context, just_modifiers) = &resolver.calls[0];
    assert_eq!(existing, &movement("IK_W", "Action=Forward"));
    assert_eq!(incoming, &movement("IK_Up", "Action=Forward"));
    assert_eq!(context, "[Movement]");
    assert!(!just_modifiers);
}

#[test]
fn test_rebind_conflict_rejected() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_Up", "Action=Forward")];

    let outcome = MergeEngine::merge(existing.clone(), &candidates, &mut FixedResolver(Resolution::Reject));

    assert_eq!(outcome.keys, existing);
    assert_eq!((outcome.added, outcome.skipped), (0, 1));
}

#[test]
fn test_modifier_conflict() {
    let existing = vec![movement("IK_Forward", "Action=Move,+")];
    let candidates = vec![movement("IK_Forward", "Action=Move,-")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Accept]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert!(resolver.calls[0].3, "Same physical key should report just_modifiers");
    assert_eq!(outcome.keys, vec![movement("IK_Forward", "Action=Move,-")]);
    assert_eq!(outcome.added, 1);
}

#[test]
fn test_other_device_is_not_a_conflict() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_Pad_LeftAxisY", "Action=Forward")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Reject]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert!(resolver.calls.is_empty());
    assert_eq!(outcome.keys.len(), 2);
    assert_eq!(outcome.added, 1);
}

#[test]
fn test_other_context_is_not_a_conflict() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![Key::binding("[Swimming]", "IK_Up", "Action=Forward")];

    let outcome = MergeEngine::merge(existing, &candidates, &mut FixedResolver(Resolution::Reject));

    assert_eq!(outcome.keys.len(), 2);
    assert_eq!((outcome.added, outcome.skipped), (1, 0));
}

#[test]
fn test_duplicate_candidate_is_ignored() {
    let existing = vec![movement("IK_W", "Action=Forward")];

    let outcome = MergeEngine::merge(existing.clone(), &existing, &mut FixedResolver(Resolution::Reject));

    assert_eq!(outcome.keys, existing);
    assert_eq!((outcome.added, outcome.skipped), (0, 0));
}

#[test]
fn test_candidates_do_not_conflict_with_each_other() {
    let candidates = vec![
        movement("IK_W", "Action=Forward"),
        movement("IK_Up", "Action=Forward"),
    ];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Reject]);
    let outcome = MergeEngine::merge(Vec::new(), &candidates, &mut resolver);

    assert!(resolver.calls.is_empty());
    assert_eq!(outcome.added, 2);
    assert_eq!(
        outcome.keys,
        vec![movement("IK_Up", "Action=Forward"), movement("IK_W", "Action=Forward")]
    );
}

#[test]
fn test_accept_all_is_sticky() {
    let existing = vec![
        movement("IK_W", "Action=Forward"),
        movement("IK_S", "Action=Back"),
    ];
    let candidates = vec![
        movement("IK_Up", "Action=Forward"),
        movement("IK_Down", "Action=Back"),
    ];

    let mut resolver = ScriptedResolver::new(vec![Resolution::AcceptAll, Resolution::Reject]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(resolver.calls.len(), 1, "Second conflict should not reach the resolver");
    assert_eq!(
        outcome.keys,
        vec![movement("IK_Down", "Action=Back"), movement("IK_Up", "Action=Forward")]
    );
    assert_eq!((outcome.added, outcome.skipped), (2, 0));
}

#[test]
fn test_reject_all_is_sticky() {
    let existing = vec![
        movement("IK_W", "Action=Forward"),
        movement("IK_S", "Action=Back"),
    ];
    let candidates = vec![
        movement("IK_Up", "Action=Forward"),
        movement("IK_Down", "Action=Back"),
        movement("IK_E", "Action=Use"),
    ];

    let mut resolver = ScriptedResolver::new(vec![Resolution::RejectAll, Resolution::Accept]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(resolver.calls.len(), 1);
    assert_eq!((outcome.added, outcome.skipped), (1, 2));
    assert!(outcome.keys.contains(&movement("IK_E", "Action=Use")));
    assert!(!outcome.keys.contains(&movement("IK_Up", "Action=Forward")));
}

#[test]
fn test_sticky_answer_does_not_outlive_merge_call() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_Up", "Action=Forward")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::RejectAll]);
    MergeEngine::merge(existing.clone(), &candidates, &mut resolver);
    MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(resolver.calls.len(), 2);
}

#[test]
fn test_candidate_against_several_existing_keys() {
    let existing = vec![
        movement("IK_W", "Action=Forward"),
        movement("IK_Up", "Action=Forward"),
    ];
    let candidates = vec![movement("IK_Down", "Action=Forward")];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Accept, Resolution::Reject]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    // One decision per conflicting pair
    assert_eq!(resolver.calls.len(), 2);
    assert_eq!((outcome.added, outcome.skipped), (1, 1));
    assert_eq!(
        outcome.keys,
        vec![movement("IK_Down", "Action=Forward"), movement("IK_Up", "Action=Forward")]
    );
}

#[test]
fn test_accepted_pairs_count_once_each() {
    let existing = vec![
        movement("IK_W", "Action=Forward"),
        movement("IK_Up", "Action=Forward"),
    ];
    let candidates = vec![movement("IK_Down", "Action=Forward")];

    let outcome = MergeEngine::merge(existing, &candidates, &mut FixedResolver(Resolution::Accept));

    assert_eq!(outcome.keys, vec![movement("IK_Down", "Action=Forward")]);
    assert_eq!(outcome.added, 2);
}

#[test]
fn test_repeated_conflicting_candidate_asked_once() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![
        movement("IK_Up", "Action=Forward"),
        movement("IK_Up", "Action=Forward"),
    ];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Accept]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(resolver.calls.len(), 1);
    assert_eq!(outcome.keys, vec![movement("IK_Up", "Action=Forward")]);
}

#[test]
fn test_placeholders_and_versions_never_conflict() {
    let existing = vec![
        Key::placeholder("[Movement]"),
        Key::version("[Movement]", "Version=1"),
    ];
    let candidates = vec![
        Key::placeholder("[Movement]"),
        Key::version("[Movement]", "Version=2"),
        movement("IK_W", "Action=Forward"),
    ];

    let mut resolver = ScriptedResolver::new(vec![Resolution::Reject]);
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert!(resolver.calls.is_empty());
    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.keys.len(), 4);
}

#[test]
fn test_closure_resolver() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![movement("IK_Up", "Action=Forward")];

    let mut seen = Vec::new();
    let mut resolver = |_: &Key, incoming: &Key, _: &str, _: bool| {
        seen.push(incoming.to_string());
        Resolution::Reject
    };
    let outcome = MergeEngine::merge(existing, &candidates, &mut resolver);

    assert_eq!(outcome.skipped, 1);
    assert_eq!(seen, vec!["IK_Up=(Action=Forward)".to_string()]);
}

#[test]
fn test_scan_reports_conflicts_without_resolving() {
    let existing = vec![movement("IK_W", "Action=Forward")];
    let candidates = vec![
        movement("IK_Up", "Action=Forward"),
        movement("IK_E", "Action=Use"),
    ];

    let mut engine = MergeEngine::new(existing);
    let conflicts = engine.scan(&candidates);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].incoming, movement("IK_Up", "Action=Forward"));
    assert_eq!(conflicts[0].conflicting, vec![movement("IK_W", "Action=Forward")]);

    let outcome = engine.finish();
    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.keys.len(), 2);
}

#[test]
fn test_is_conflict_rules() {
    let w = movement("IK_W", "Action=Forward");

    assert!(is_conflict(&w, &movement("IK_Up", "Action=Forward")));
    assert!(is_conflict(&w, &movement("IK_W", "Action=Forward,State=Axis")));
    assert!(!is_conflict(&w, &w));
    assert!(!is_conflict(&w, &movement("IK_W", "Action=Use")));
    assert!(!is_conflict(&w, &movement("IK_Pad_A_CROSS", "Action=Forward")));
    assert!(!is_conflict(&w, &Key::placeholder("[Movement]")));
}

#[test]
fn test_remove_keys_exact_matches_only() {
    let existing = vec![
        Key::placeholder("[Movement]"),
        movement("IK_W", "Action=Forward"),
        movement("IK_E", "Action=Use"),
    ];
    let installed = vec![
        Key::placeholder("[Movement]"),
        movement("IK_E", "Action=Use"),
        movement("IK_W", "Action=Forward,State=Axis"),
    ];

    let (remaining, removed) = remove_keys(existing, &installed);

    assert_eq!(removed, 1);
    assert_eq!(
        remaining,
        vec![Key::placeholder("[Movement]"), movement("IK_W", "Action=Forward")]
    );
}

#[test]
fn test_remove_last_binding_keeps_section_header() {
    let existing = vec![
        Key::binding("[Boat]", "IK_X", "Action=Jump"),
        movement("IK_W", "Action=Forward"),
    ];
    let installed = vec![Key::binding("[Boat]", "IK_X", "Action=Jump")];

    let (remaining, removed) = remove_keys(existing, &installed);

    assert_eq!(removed, 1);
    assert_eq!(
        remaining,
        vec![Key::placeholder("[Boat]"), movement("IK_W", "Action=Forward")]
    );
}

//! Tree-level matching properties.

use waypoint::routing::matcher::MatchOutcome;
use waypoint::routing::tree::{RouteSpec, RouteTree};

fn app_tree() -> RouteTree {
    RouteTree::build(vec![RouteSpec::layout().children([
        RouteSpec::index(),
        RouteSpec::path("contacts").children([
            RouteSpec::index(),
            RouteSpec::path("new"),
            RouteSpec::path(":id").child(RouteSpec::path("edit")),
        ]),
        RouteSpec::path("about"),
    ])])
    .unwrap()
}

#[test]
fn test_matched_chain_reproduces_input_path() {
    let tree = app_tree();
    for path in ["/contacts", "/contacts/new", "/contacts/42", "/contacts/42/edit", "/about"] {
        let m = match tree.resolve(path) {
            MatchOutcome::Matched(m) => m,
            MatchOutcome::NoMatch => panic!("expected {path} to match"),
        };
        let leaf = m.matches.last().unwrap().node;
        assert_eq!(
            tree.path_for(leaf, &m.params).as_deref(),
            Some(path),
            "round-trip failed for {path}"
        );
    }
}

#[test]
fn test_every_leaf_round_trips() {
    let tree = app_tree();
    for pattern in tree.leaf_paths() {
        // Substitute dummy values for dynamic segments, then match the
        // resulting concrete path back to a leaf with the same pattern.
        let concrete = pattern.replace(":id", "99");
        let m = match tree.resolve(&concrete) {
            MatchOutcome::Matched(m) => m,
            MatchOutcome::NoMatch => panic!("leaf pattern {pattern} did not match {concrete}"),
        };
        assert_eq!(m.matches.last().unwrap().path, pattern);
    }
}

#[test]
fn test_literal_sibling_beats_dynamic_for_exact_text() {
    let tree = app_tree();
    let m = match tree.resolve("/contacts/new") {
        MatchOutcome::Matched(m) => m,
        MatchOutcome::NoMatch => panic!("expected a match"),
    };
    assert_eq!(m.matches.last().unwrap().path, "/contacts/new");
    assert!(m.params.get("id").is_none());
}

#[test]
fn test_no_match_for_unknown_and_overlong_paths() {
    let tree = app_tree();
    assert_eq!(tree.resolve("/missing"), MatchOutcome::NoMatch);
    assert_eq!(tree.resolve("/contacts/42/edit/extra"), MatchOutcome::NoMatch);
    assert_eq!(tree.resolve("/about/team"), MatchOutcome::NoMatch);
}

#[test]
fn test_root_index_matches_empty_path() {
    let tree = app_tree();
    let m = match tree.resolve("/") {
        MatchOutcome::Matched(m) => m,
        MatchOutcome::NoMatch => panic!("expected the root index to match"),
    };
    assert!(m.params.is_empty());
}

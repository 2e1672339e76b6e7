use pocketplan::extract::fuzzy::{match_entity, normalize_name, similarity, EntityMatch, MatchKind};

#[test]
fn test_direct_containment_needs_no_edit_distance() {
    let names = ["Roommates", "ski trip"];
    assert_eq!(
        match_entity("Ski Trip", &names),
        EntityMatch::Matched { index: 1, kind: MatchKind::Direct },
        "Normalization alone should match"
    );
    assert_eq!(
        match_entity("the ski trip group", &names),
        EntityMatch::Matched { index: 1, kind: MatchKind::Direct }
    );
}

#[test]
fn test_synonyms_fold_before_matching() {
    let names = ["Travel Fund", "Groceries"];
    assert_eq!(match_entity("vacation", &names).index(), Some(0));
    assert_eq!(match_entity("food", &names).index(), Some(1));
}

#[test]
fn test_singular_match() {
    let names = ["Movie Nights"];
    assert_eq!(match_entity("movie night", &names), EntityMatch::Matched { index: 0, kind: MatchKind::Singular });
}

#[test]
fn test_closer_name_wins_by_margin() {
    // distance 1 to "cabin", 3 to "robin"
    let names = ["Robin", "Cabin"];
    assert_eq!(match_entity("cabinn", &names), EntityMatch::Matched { index: 1, kind: MatchKind::EditDistance(1) });
}

#[test]
fn test_near_tie_is_ambiguous() {
    // one edit from both names
    let names = ["Beach", "Bench"];
    match match_entity("beech", &names) {
        EntityMatch::Ambiguous(indices) => assert_eq!(indices, vec![0, 1]),
        other => panic!("Expected an ambiguous match, got {other:?}"),
    }
}

#[test]
fn test_far_names_do_not_match() {
    assert_eq!(match_entity("groceries", &["Roommates"]), EntityMatch::NoMatch);
    assert_eq!(match_entity("", &["Roommates"]), EntityMatch::NoMatch);
    assert_eq!(match_entity("rent", &[] as &[&str]), EntityMatch::NoMatch);
}

#[test]
fn test_matching_is_deterministic() {
    let names = ["Beach House", "Ski Trip", "Roommates"];
    for candidate in ["beach", "roomates", "ski", "nothing like it"] {
        assert_eq!(match_entity(candidate, &names), match_entity(candidate, &names));
    }
}

#[test]
fn test_similarity_bounds() {
    assert_eq!(similarity("", ""), 1.0);
    assert_eq!(similarity("travel", "travel"), 1.0);
    assert!(similarity(&normalize_name("Travel Fund"), "travle") >= 0.6);
}

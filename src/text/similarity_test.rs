use super::*;

const PHILOSOPHER: &str = "Harry Potter and the Philosopher's Stone";

// =============================================================================
// edit_distance / similarity
// =============================================================================

#[test]
fn edit_distance_classic_examples() {
    assert_eq!(edit_distance("kitten", "sitting"), 3);
    assert_eq!(edit_distance("", "abc"), 3);
    assert_eq!(edit_distance("sách", "sach"), 1);
}

#[test]
fn similarity_identical_is_one() {
    assert!((similarity("Mắt Biếc", "Mắt Biếc") - 1.0).abs() < f64::EPSILON);
    assert!((similarity("Harry", "harry") - 1.0).abs() < f64::EPSILON);
}

#[test]
fn similarity_ignores_diacritics() {
    assert!((similarity("Mắt Biếc", "mat biec") - 1.0).abs() < f64::EPSILON);
}

#[test]
fn similarity_empty_inputs() {
    assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
    assert!(similarity("abc", "").abs() < f64::EPSILON);
    assert!(similarity("", "abc").abs() < f64::EPSILON);
}

#[test]
fn similarity_partial_overlap() {
    let s = similarity("kitten", "sitting");
    assert!((s - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
}

#[test]
fn similarity_stays_in_unit_interval() {
    let pairs = [("a", "zzzzzzzz"), ("abc", "xyz"), ("harry poter", PHILOSOPHER), ("!!", "??"), ("x", "x")];
    for (a, b) in pairs {
        let s = similarity(a, b);
        assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} gave {s}");
    }
}

// =============================================================================
// token_matches
// =============================================================================

#[test]
fn token_matches_substring_of_word() {
    assert!(token_matches("pot", PHILOSOPHER));
}

#[test]
fn token_matches_misspelled_token() {
    assert!(token_matches("poter", PHILOSOPHER));
}

#[test]
fn token_matches_any_token_is_enough() {
    assert!(token_matches("xyzzy harry", PHILOSOPHER));
}

#[test]
fn token_matches_rejects_unrelated_term() {
    assert!(!token_matches("qqqq", PHILOSOPHER));
}

#[test]
fn token_matches_empty_term_is_false() {
    assert!(!token_matches("", PHILOSOPHER));
}

// =============================================================================
// token_near_match
// =============================================================================

#[test]
fn token_near_match_tolerates_typo() {
    assert!(token_near_match("Harry Poter", PHILOSOPHER));
}

#[test]
fn token_near_match_tolerates_missing_accents() {
    assert!(token_near_match("mat biec", "Mắt Biếc"));
}

#[test]
fn token_near_match_requires_every_token() {
    assert!(!token_near_match("Harry Granger", PHILOSOPHER));
}

#[test]
fn token_near_match_empty_term_is_false() {
    assert!(!token_near_match("", PHILOSOPHER));
    assert!(!token_near_match("...", PHILOSOPHER));
}

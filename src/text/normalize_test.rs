use super::*;

#[test]
fn normalize_strips_vietnamese_diacritics() {
    assert_eq!(normalize("Có bao nhiêu sách?"), "co bao nhieu sach");
    assert_eq!(normalize("Tạm biệt!"), "tam biet");
}

#[test]
fn normalize_folds_d_with_stroke() {
    assert_eq!(normalize("Đắc Nhân Tâm"), "dac nhan tam");
    assert_eq!(normalize("đọc"), "doc");
}

#[test]
fn normalize_replaces_punctuation_and_collapses_whitespace() {
    assert_eq!(normalize("  Harry   POTTER's\tStone!! "), "harry potter s stone");
    assert_eq!(normalize("a,b;c"), "a b c");
}

#[test]
fn normalize_keeps_digits() {
    assert_eq!(normalize("Top 10 sách"), "top 10 sach");
}

#[test]
fn normalize_empty_and_punctuation_only() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("?!... --"), "");
}

#[test]
fn normalize_is_idempotent() {
    let samples = [
        "Harry Potter and the Philosopher's Stone",
        "Nguyễn Nhật Ánh — Mắt Biếc",
        "İstanbul",
        "ÀÉÎÕÜ ñ ç",
        "   ",
        "top sách yêu thích",
        "«Dế Mèn phiêu lưu ký»",
    ];
    for s in samples {
        let once = normalize(s);
        assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
    }
}

#[test]
fn contains_phrase_respects_word_boundaries() {
    let text = padded(&normalize("Có bao nhiêu sách"));
    assert!(contains_phrase(&text, "bao nhieu"));
    assert!(contains_phrase(&text, "sach"));
    assert!(!contains_phrase(&text, "ach"));
}

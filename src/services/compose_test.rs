use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::services::catalog::CategoryItem;
use crate::services::intent::SearchParams;
use crate::state::test_helpers;

fn analysis(intent: Intent, query_type: &str) -> IntentAnalysis {
    IntentAnalysis {
        intent,
        query_type: query_type.into(),
        search_params: SearchParams::default(),
        context_reference: None,
        explanation: "test".into(),
    }
}

fn categories(names: &[&str]) -> Vec<CategoryItem> {
    names
        .iter()
        .zip(1..)
        .map(|(name, id)| CategoryItem { id, name: (*name).to_string(), book_count: 0 })
        .collect()
}

fn numbered_lines(reply: &str) -> usize {
    reply.lines().filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit())).count()
}

// =============================================================================
// deterministic templates
// =============================================================================

#[test]
fn count_is_one_sentence_with_number() {
    let results = QueryResultSet { total_books: 6, ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::CountBooks, "count"), &results);
    assert_eq!(reply, "Thư viện hiện có 6 cuốn sách.");

    let results = QueryResultSet { total_authors: 5, ..QueryResultSet::default() };
    assert!(compose(&analysis(Intent::CountAuthors, "count"), &results).contains('5'));
}

#[test]
fn count_with_author_names_author() {
    let mut a = analysis(Intent::CountBooks, "count");
    a.search_params.author = Some("Nguyễn Nhật Ánh".into());
    let results = QueryResultSet { total_books: 2, ..QueryResultSet::default() };
    assert_eq!(compose(&a, &results), "Thư viện hiện có 2 cuốn sách của Nguyễn Nhật Ánh.");
}

#[test]
fn recommend_lists_at_most_five() {
    let mut books = test_helpers::seed_books();
    books.extend(test_helpers::seed_books().into_iter().map(|mut b| {
        b.id += 100;
        b
    }));
    let results = QueryResultSet { trending_books: books, ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::Recommend, "favorite"), &results);
    assert!(reply.starts_with("Những cuốn sách được yêu thích nhất:"));
    assert_eq!(numbered_lines(&reply), MAX_RECOMMENDED);
    assert!(reply.contains("1. \"Harry Potter and the Philosopher's Stone\" - J.K. Rowling"));
}

#[test]
fn detail_describes_focused_book() {
    let books = test_helpers::seed_books();
    let results = QueryResultSet {
        focused_book: Some(books[0].clone()),
        books: vec![books[0].clone()],
        related_books: vec![books[1].clone()],
        ..QueryResultSet::default()
    };
    let reply = compose(&analysis(Intent::AskAboutBook, "detail"), &results);
    assert!(reply.starts_with("\"Harry Potter and the Philosopher's Stone\" là sách của J.K. Rowling."));
    assert!(reply.contains("Thể loại: Fantasy."));
    assert!(reply.contains("Đánh giá: 4.8/5."));
    assert!(reply.contains("Hogwarts"));
    assert!(reply.contains("Cùng thể loại còn có: \"Mắt Biếc\"."));
}

#[test]
fn detail_without_rating_or_synopsis_skips_them() {
    let mut book = test_helpers::seed_books().remove(5);
    book.synopsis = None;
    let results = QueryResultSet { focused_book: Some(book), ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::FollowUp, "detail"), &results);
    assert!(!reply.contains("Đánh giá"));
    assert!(!reply.contains("Nội dung"));
    assert!(reply.contains("\"Dune\""));
}

#[test]
fn list_books_caps_at_twenty_with_overflow_note() {
    let books: Vec<BookItem> = (1..=25)
        .map(|id| BookItem {
            id,
            title: format!("Book {id}"),
            author: None,
            category: None,
            rating: None,
            favorite_count: 0,
            synopsis: None,
        })
        .collect();
    let results = QueryResultSet { total_books: 25, books, ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::ListBooks, "list"), &results);
    assert!(reply.starts_with("Thư viện có 25 cuốn sách:"));
    assert_eq!(numbered_lines(&reply), MAX_LISTED);
    assert!(reply.ends_with("... và 5 cuốn khác."));
}

#[test]
fn generic_list_names_categories() {
    let results = QueryResultSet { all_categories: categories(&["Fantasy", "Lịch sử"]), ..QueryResultSet::default() };
    assert_eq!(compose(&analysis(Intent::List, "list"), &results), "Các thể loại hiện có: Fantasy, Lịch sử.");
}

#[test]
fn search_summary_shows_three() {
    let books = test_helpers::seed_books();
    let results = QueryResultSet { total_books: books.len() as u64, books, ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::SearchBook, "search"), &results);
    assert!(reply.starts_with("Mình tìm thấy 6 cuốn sách phù hợp:"));
    assert_eq!(numbered_lines(&reply), MAX_SUMMARY);
    assert!(reply.ends_with("... và 3 cuốn khác."));
}

#[test]
fn no_books_offers_categories_then_apologizes() {
    let results = QueryResultSet { all_categories: categories(&["Fantasy"]), ..QueryResultSet::default() };
    let reply = compose(&analysis(Intent::SearchBook, "search"), &results);
    assert_eq!(reply, "Mình chưa tìm thấy cuốn sách phù hợp. Các thể loại hiện có: Fantasy.");

    assert_eq!(compose(&analysis(Intent::SearchBook, "search"), &QueryResultSet::default()), APOLOGY);
    assert_eq!(compose(&analysis(Intent::CountBooks, "count"), &QueryResultSet::default()), APOLOGY);
}

// =============================================================================
// grounding
// =============================================================================

#[test]
fn grounded_when_a_title_is_named() {
    let books = test_helpers::seed_books();
    let results = QueryResultSet { books: books[..2].to_vec(), ..QueryResultSet::default() };
    assert!(is_grounded("Bạn nên đọc HARRY POTTER AND THE PHILOSOPHER'S STONE nhé", &results));
    assert!(is_grounded("Mat Biec rat hay", &results));
    assert!(!is_grounded("Bạn thử đọc \"Nhà Giả Kim\" xem", &results));
}

#[test]
fn categories_ground_when_no_titles() {
    let results = QueryResultSet { all_categories: categories(&["Trinh thám"]), ..QueryResultSet::default() };
    assert!(is_grounded("Thư viện có nhiều sách trinh thám.", &results));
    assert!(!is_grounded("Bạn thích thơ không?", &results));
}

#[test]
fn nothing_to_validate_passes() {
    assert!(is_grounded("bất kỳ câu nào", &QueryResultSet::default()));
}

#[test]
fn deterministic_replies_are_always_grounded() {
    let books = test_helpers::seed_books();
    let sets = [
        QueryResultSet { books: books.clone(), total_books: 6, ..QueryResultSet::default() },
        QueryResultSet { focused_book: Some(books[2].clone()), ..QueryResultSet::default() },
        QueryResultSet { top_rated_books: books[..3].to_vec(), ..QueryResultSet::default() },
    ];
    for intent in [Intent::SearchBook, Intent::AskAboutBook, Intent::Recommend, Intent::ListBooks, Intent::FollowUp] {
        for results in &sets {
            let reply = compose(&analysis(intent, "rating"), results);
            assert!(is_grounded(&reply, results), "{intent}: {reply}");
        }
    }
}

// =============================================================================
// small talk / prompts
// =============================================================================

#[test]
fn greeting_pick_is_seeded() {
    let mut a = StdRng::seed_from_u64(7);
    let mut b = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        let first = small_talk_reply(Intent::Greeting, &mut a).unwrap();
        assert_eq!(Some(first), small_talk_reply(Intent::Greeting, &mut b));
        assert!(GREETING_REPLIES.contains(&first));
    }
    assert_eq!(small_talk_reply(Intent::Farewell, &mut a), Some(FAREWELL_REPLY));
    assert_eq!(small_talk_reply(Intent::Thanks, &mut a), Some(THANKS_REPLY));
    assert!(small_talk_reply(Intent::SearchBook, &mut a).is_none());
}

#[test]
fn data_dump_lists_books_and_categories() {
    let books = test_helpers::seed_books();
    let results = QueryResultSet {
        focused_book: Some(books[0].clone()),
        all_categories: categories(&["Fantasy"]),
        ..QueryResultSet::default()
    };
    let dump = data_dump(&results);
    assert!(dump.contains("- \"Harry Potter and the Philosopher's Stone\" | author: J.K. Rowling"));
    assert!(dump.contains("Synopsis: "));
    assert!(dump.contains("Categories: Fantasy"));

    let prompt = data_prompt("sách gì hay?", "user: hi", &results);
    assert!(prompt.contains("sách gì hay?"));
    assert!(prompt.contains("user: hi"));
}

#[test]
fn normalized_query_parsing() {
    assert_eq!(parse_normalized_query("\"Harry Potter\"\n"), Some("Harry Potter".into()));
    assert_eq!(parse_normalized_query("\n  Dune.  \nextra"), Some("Dune".into()));
    assert!(parse_normalized_query("NONE").is_none());
    assert!(parse_normalized_query("   ").is_none());
}

//! Structural invariants that must hold for every parsed translation.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rs_bible::{
    book_chapter_verse, clean_html, BibleParser, Form, OsisParser, ParsedBible, Version,
};

fn all_samples() -> Vec<ParsedBible> {
    vec![
        OsisParser::new(Version::KingJames, Path::new("testdata/kjv.sample.xml"))
            .parse()
            .unwrap(),
        OsisParser::new(Version::AmericanStandard, Path::new("testdata/asv.sample.xml"))
            .parse()
            .unwrap(),
    ]
}

#[test]
fn offsets_are_monotone_and_ordered() {
    for bible in all_samples() {
        for form in Form::ALL {
            let rendered = bible.form(form);
            let mut previous_start = 0;

            for (verse_id, &start) in &rendered.start_indices {
                let end = rendered.end_indices[verse_id];

                assert!(start <= end, "{}: start after end for {verse_id}", form.name());
                assert!(
                    start >= previous_start,
                    "{}: offsets regress at {verse_id}",
                    form.name()
                );
                assert!(
                    end <= rendered.content.len(),
                    "{}: end offset out of bounds for {verse_id}",
                    form.name()
                );
                previous_start = start;
            }
        }
    }
}

#[test]
fn all_twelve_index_maps_cover_the_same_verses() {
    for bible in all_samples() {
        let reference: BTreeSet<u32> = bible
            .form(Form::Html)
            .start_indices
            .keys()
            .copied()
            .collect();
        assert!(!reference.is_empty());

        for form in Form::ALL {
            let rendered = bible.form(form);
            let starts: BTreeSet<u32> = rendered.start_indices.keys().copied().collect();
            let ends: BTreeSet<u32> = rendered.end_indices.keys().copied().collect();

            assert_eq!(starts, reference, "start key set differs for {}", form.name());
            assert_eq!(ends, reference, "end key set differs for {}", form.name());
        }
    }
}

#[test]
fn every_indexed_verse_is_accessible() {
    for bible in all_samples() {
        let verse_ids: Vec<u32> = bible
            .form(Form::PlainText)
            .start_indices
            .keys()
            .copied()
            .collect();

        for form in Form::ALL {
            let accessor = bible.bible(form);
            for &verse_id in &verse_ids {
                let text = accessor.get_scripture(verse_id, None).unwrap();

                // Only a readers rendering of a notes-only verse may be empty.
                if !form.is_readers() {
                    assert!(!text.is_empty(), "{}: {verse_id} came back empty", form.name());
                }
            }
        }
    }
}

static PLAIN_VERSE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());
static HTML_VERSE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sup>\d+</sup>").unwrap());

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn readers_form_is_the_scholar_form_without_markers() {
    for bible in all_samples() {
        let verse_ids: Vec<u32> = bible
            .form(Form::PlainText)
            .start_indices
            .keys()
            .copied()
            .collect();

        let plain = bible.bible(Form::PlainText);
        let plain_readers = bible.bible(Form::PlainTextReaders);
        let html = bible.bible(Form::Html);
        let html_readers = bible.bible(Form::HtmlReaders);

        for &verse_id in &verse_ids {
            let scholar = plain.get_scripture(verse_id, None).unwrap();
            let stripped = PLAIN_VERSE_NUMBER
                .replace(&scholar, "")
                .replace(['[', ']'], "");
            assert_eq!(
                squash(&stripped),
                squash(&plain_readers.get_scripture(verse_id, None).unwrap()),
                "plain readers differs for {verse_id}"
            );

            let scholar_html = html.get_scripture(verse_id, None).unwrap();
            let stripped_html = clean_html(
                &HTML_VERSE_NUMBER
                    .replace_all(&scholar_html, "")
                    .replace(['[', ']'], ""),
            );
            assert_eq!(
                squash(&stripped_html),
                squash(&html_readers.get_scripture(verse_id, None).unwrap()),
                "html readers differs for {verse_id}"
            );
        }
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack_chars = haystack.chars();
    needle
        .chars()
        .all(|c| haystack_chars.by_ref().any(|h| h == c))
}

#[test]
fn notes_form_contains_the_scholar_form() {
    for bible in all_samples() {
        let verse_ids: Vec<u32> = bible
            .form(Form::PlainText)
            .start_indices
            .keys()
            .copied()
            .collect();

        for (scholar_form, notes_form) in [
            (Form::PlainText, Form::PlainTextNotes),
            (Form::Html, Form::HtmlNotes),
        ] {
            let scholar = bible.bible(scholar_form);
            let notes = bible.bible(notes_form);

            for &verse_id in &verse_ids {
                let scholar_text = scholar.get_scripture(verse_id, None).unwrap();
                let notes_text = notes.get_scripture(verse_id, None).unwrap();

                assert!(
                    is_subsequence(&scholar_text, &notes_text),
                    "{}: scholar text of {verse_id} is not contained in notes text",
                    scholar_form.name()
                );
            }
        }
    }
}

#[test]
fn max_verses_match_the_index_maps() {
    for bible in all_samples() {
        let mut highest: Vec<(u32, u32)> = Vec::new();

        for &verse_id in bible.form(Form::PlainText).start_indices.keys() {
            let (book, chapter, verse) = book_chapter_verse(verse_id).unwrap();

            assert_eq!(
                bible
                    .max_verse(book, chapter)
                    .map(|max| verse <= max),
                Some(true),
                "max_verses misses {verse_id}"
            );
            highest.push((book.number() * 1_000 + chapter, verse));
        }

        // And the recorded maximum is actually attained by some verse.
        for (book, chapters) in bible_books(&bible) {
            for (chapter, max) in chapters {
                assert!(
                    highest.contains(&(book * 1_000 + chapter, max)),
                    "recorded max {max} for book {book} chapter {chapter} not attained"
                );
            }
        }
    }
}

fn bible_books(bible: &ParsedBible) -> Vec<(u32, Vec<(u32, u32)>)> {
    rs_bible::Book::ALL
        .iter()
        .filter_map(|&book| {
            bible.max_verses(book).map(|chapters| {
                (
                    book.number(),
                    chapters.iter().map(|(&c, &m)| (c, m)).collect(),
                )
            })
        })
        .collect()
}

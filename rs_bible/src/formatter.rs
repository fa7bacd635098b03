use once_cell::sync::Lazy;
use regex::Regex;

use crate::books;
use crate::{BibleError, Book, Form, ParsedBible};

/// Output choices for [`format_passage`].
#[derive(Debug, Clone, Copy)]
pub struct PassageOptions {
    /// Emit HTML headings and paragraphs instead of plain text.
    pub html: bool,
    /// Use the translation's full book titles instead of the short ones.
    pub full_title: bool,
    /// Keep the verse-number markers (scholar form); otherwise the readers
    /// form is used.
    pub include_verse_numbers: bool,
}

impl Default for PassageOptions {
    fn default() -> Self {
        Self {
            html: true,
            full_title: false,
            include_verse_numbers: true,
        }
    }
}

/// Compose a titled, chapter-structured passage for the given verse ids.
///
/// Ids are grouped by book and chapter in first-appearance order, each book
/// gets a title, each chapter a heading, and the verse texts are joined into
/// the paragraphs they were rendered with. Verses missing from the
/// translation are skipped.
///
/// # Errors
///
/// Returns `InvalidVerse` when an id does not decode to a canonical book.
pub fn format_passage(
    bible: &ParsedBible,
    verse_ids: &[u32],
    options: &PassageOptions,
) -> Result<String, BibleError> {
    let form = match (options.html, options.include_verse_numbers) {
        (true, true) => Form::Html,
        (true, false) => Form::HtmlReaders,
        (false, true) => Form::PlainText,
        (false, false) => Form::PlainTextReaders,
    };

    let mut text = String::new();

    for (book, chapters) in group_by_book_and_chapter(verse_ids)? {
        let title = if options.full_title {
            bible.book_title(book)
        } else {
            bible.short_book_title(book)
        };
        text.push_str(&format_title(title, options.html, text.is_empty()));

        for (chapter, ids) in chapters {
            text.push_str(&format_chapter(chapter, options.html));

            for paragraph in chapter_paragraphs(bible, form, &ids) {
                text.push_str(&format_paragraph(&paragraph, options.html));
            }
        }
    }

    Ok(text)
}

type Grouped = Vec<(Book, Vec<(u32, Vec<u32>)>)>;

fn group_by_book_and_chapter(verse_ids: &[u32]) -> Result<Grouped, BibleError> {
    let mut grouped: Grouped = Vec::new();

    for &verse_id in verse_ids {
        let (book, chapter, _) = books::book_chapter_verse(verse_id).ok_or_else(|| {
            BibleError::InvalidVerse(format!("verse id ({verse_id}) is not a valid verse id."))
        })?;

        let book_position = grouped
            .iter()
            .position(|(entry, _)| *entry == book)
            .unwrap_or_else(|| {
                grouped.push((book, Vec::new()));
                grouped.len() - 1
            });
        let chapters = &mut grouped[book_position].1;

        match chapters.iter_mut().find(|(entry, _)| *entry == chapter) {
            Some((_, ids)) => ids.push(verse_id),
            None => chapters.push((chapter, vec![verse_id])),
        }
    }

    Ok(grouped)
}

/// Rebuild the paragraphs covering the given verses of one chapter from the
/// raw rendered slices: the content already carries its paragraph markers,
/// so the concatenation is split back apart on them.
fn chapter_paragraphs(bible: &ParsedBible, form: Form, verse_ids: &[u32]) -> Vec<String> {
    let rendered = bible.form(form);

    let mut raw = String::new();
    for verse_id in verse_ids {
        let (Some(&start), Some(&end)) = (
            rendered.start_indices.get(verse_id),
            rendered.end_indices.get(verse_id),
        ) else {
            continue;
        };

        if let Some(slice) = rendered.content.get(start..end) {
            raw.push_str(slice);
        }
    }

    let pieces: Vec<&str> = if form.is_html() {
        raw.split("</p>")
            .flat_map(|piece| piece.split("<p>"))
            .collect()
    } else {
        raw.split('\n').collect()
    };

    pieces
        .into_iter()
        .map(clean_paragraph)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

static EXTRA_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

fn clean_paragraph(paragraph: &str) -> String {
    EXTRA_WHITESPACE
        .replace_all(paragraph, " ")
        .trim()
        .to_string()
}

fn format_title(title: &str, html: bool, is_first_book: bool) -> String {
    if html {
        format!("<h1>{title}</h1>\n")
    } else if is_first_book {
        format!("{title}\n\n")
    } else {
        format!("\n\n{title}\n\n")
    }
}

fn format_chapter(chapter: u32, html: bool) -> String {
    if html {
        format!("<h2>Chapter {chapter}</h2>\n")
    } else {
        format!("Chapter {chapter}\n\n")
    }
}

fn format_paragraph(paragraph: &str, html: bool) -> String {
    if html {
        format!("<p>{paragraph}</p>\n")
    } else {
        format!("   {paragraph}\n")
    }
}

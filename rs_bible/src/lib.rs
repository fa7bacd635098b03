use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod books;
pub mod formatter;
mod iterators;
pub mod osis;
pub mod writer;

pub use self::books::{book_chapter_verse, is_valid_verse_id, verse_id, Book};
pub use self::iterators::{VerseIter, VerseWithReference};
pub use self::osis::OsisParser;

/// Plugin interface for creating a new translation parser. Primarily designed
/// to make it easier to add source formats besides OSIS later.
pub trait BibleParser {
    /// Error type to be returned if there is a failure while parsing.
    type Err: std::error::Error;
    /// Parse using the parser-specific implementation.
    /// # Errors
    ///
    /// Customize type of errors returned with `Err` associated type.
    fn parse(self) -> Result<ParsedBible, Self::Err>;
}

/// Public-domain translations with known OSIS sources.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Version {
    AmericanKingJames,
    AmericanStandard,
    BibleInBasicEnglish,
    Darby,
    DouayRheims,
    KingJames,
    Webster,
    WorldEnglish,
    WorldwideEnglish,
    YoungsLiteral,
}

impl Version {
    pub const ALL: [Self; 10] = [
        Self::AmericanKingJames,
        Self::AmericanStandard,
        Self::BibleInBasicEnglish,
        Self::Darby,
        Self::DouayRheims,
        Self::KingJames,
        Self::Webster,
        Self::WorldEnglish,
        Self::WorldwideEnglish,
        Self::YoungsLiteral,
    ];

    /// Short upper-case version code, e.g. `KJV`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AmericanKingJames => "AKJV",
            Self::AmericanStandard => "ASV",
            Self::BibleInBasicEnglish => "BBE",
            Self::Darby => "DARBY",
            Self::DouayRheims => "DOUR",
            Self::KingJames => "KJV",
            Self::Webster => "WBT",
            Self::WorldEnglish => "WEB",
            Self::WorldwideEnglish => "BWE",
            Self::YoungsLiteral => "YLT",
        }
    }

    /// Lower-case stem of the version's XML and output file names.
    #[must_use]
    pub fn file_stem(self) -> String {
        self.code().to_ascii_lowercase()
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|version| version.code().eq_ignore_ascii_case(code))
    }
}

/// The six parallel renderings of a translation: {HTML, plain text} crossed
/// with {scholar, readers, notes}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Form {
    Html,
    HtmlReaders,
    HtmlNotes,
    PlainText,
    PlainTextReaders,
    PlainTextNotes,
}

impl Form {
    pub const ALL: [Self; 6] = [
        Self::Html,
        Self::HtmlReaders,
        Self::HtmlNotes,
        Self::PlainText,
        Self::PlainTextReaders,
        Self::PlainTextNotes,
    ];

    #[must_use]
    pub const fn is_html(self) -> bool {
        matches!(self, Self::Html | Self::HtmlReaders | Self::HtmlNotes)
    }

    /// Readers forms carry no verse numbers and no bracketed insertions.
    #[must_use]
    pub const fn is_readers(self) -> bool {
        matches!(self, Self::HtmlReaders | Self::PlainTextReaders)
    }

    /// Notes forms additionally inline translator marginal readings.
    #[must_use]
    pub const fn is_notes(self) -> bool {
        matches!(self, Self::HtmlNotes | Self::PlainTextNotes)
    }

    /// Stable lower-case name, also used for emitted file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::HtmlReaders => "html_readers",
            Self::HtmlNotes => "html_notes",
            Self::PlainText => "plain_text",
            Self::PlainTextReaders => "plain_text_readers",
            Self::PlainTextNotes => "plain_text_notes",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|form| form.name() == name)
    }
}

/// One rendered form of a whole translation: the content string plus the
/// per-verse offset tables into it. Offsets are UTF-8 byte indices, for
/// starts and ends alike.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RenderedForm {
    pub content: String,
    pub start_indices: BTreeMap<u32, usize>,
    pub end_indices: BTreeMap<u32, usize>,
}

/// A fully parsed translation: the six rendered forms, per-book titles, and
/// per-chapter maximum verse numbers. Sealed once the parser returns it;
/// accessors and formatters only ever read it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParsedBible {
    version: Version,
    forms: [RenderedForm; 6],
    long_titles: BTreeMap<Book, String>,
    short_titles: BTreeMap<Book, String>,
    max_verses: BTreeMap<Book, BTreeMap<u32, u32>>,
    unknown_tags: BTreeSet<String>,
}

impl ParsedBible {
    pub(crate) fn new(
        version: Version,
        forms: [RenderedForm; 6],
        long_titles: BTreeMap<Book, String>,
        short_titles: BTreeMap<Book, String>,
        max_verses: BTreeMap<Book, BTreeMap<u32, u32>>,
        unknown_tags: BTreeSet<String>,
    ) -> Self {
        Self {
            version,
            forms,
            long_titles,
            short_titles,
            max_verses,
            unknown_tags,
        }
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn form(&self, form: Form) -> &RenderedForm {
        &self.forms[form as usize]
    }

    /// Read-only accessor over one rendered form.
    #[must_use]
    pub fn bible(&self, form: Form) -> Bible<'_> {
        let rendered = self.form(form);
        Bible::new(
            self.version,
            &rendered.content,
            &rendered.start_indices,
            &rendered.end_indices,
            form.is_html(),
        )
    }

    /// Full title for the book, falling back to the canonical name when the
    /// translation never supplied one.
    #[must_use]
    pub fn book_title(&self, book: Book) -> &str {
        self.long_titles
            .get(&book)
            .map_or_else(|| book.title(), String::as_str)
    }

    #[must_use]
    pub fn short_book_title(&self, book: Book) -> &str {
        self.short_titles
            .get(&book)
            .map_or_else(|| book.short_title(), String::as_str)
    }

    /// Highest verse number seen per chapter of the given book.
    #[must_use]
    pub fn max_verses(&self, book: Book) -> Option<&BTreeMap<u32, u32>> {
        self.max_verses.get(&book)
    }

    #[must_use]
    pub fn max_verse(&self, book: Book, chapter: u32) -> Option<u32> {
        self.max_verses.get(&book)?.get(&chapter).copied()
    }

    /// Tags encountered during parsing that the renderer does not recognise.
    #[must_use]
    pub fn unknown_tags(&self) -> &BTreeSet<String> {
        &self.unknown_tags
    }

    /// Iterate the verses of one form in emission order.
    #[must_use]
    pub fn verses(&self, form: Form) -> VerseIter<'_> {
        VerseIter::new(self.form(form))
    }

    pub(crate) fn long_titles(&self) -> &BTreeMap<Book, String> {
        &self.long_titles
    }

    pub(crate) fn short_titles(&self) -> &BTreeMap<Book, String> {
        &self.short_titles
    }

    pub(crate) fn all_max_verses(&self) -> &BTreeMap<Book, BTreeMap<u32, u32>> {
        &self.max_verses
    }
}

/// All possible errors that this library can return.
#[derive(Error, Debug)]
pub enum BibleError {
    #[error("OSIS parsing error")]
    ParsingError {
        #[from]
        source: osis::OsisError,
    },

    #[error("Invalid verse: {0}")]
    InvalidVerse(String),
}

/// Read-only accessor over one rendered form of a sealed translation.
#[derive(Debug, Clone, Copy)]
pub struct Bible<'a> {
    version: Version,
    content: &'a str,
    start_indices: &'a BTreeMap<u32, usize>,
    end_indices: &'a BTreeMap<u32, usize>,
    is_html: bool,
}

impl<'a> Bible<'a> {
    #[must_use]
    pub fn new(
        version: Version,
        content: &'a str,
        start_indices: &'a BTreeMap<u32, usize>,
        end_indices: &'a BTreeMap<u32, usize>,
        is_html: bool,
    ) -> Self {
        Self {
            version,
            content,
            start_indices,
            end_indices,
            is_html,
        }
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub const fn is_html(&self) -> bool {
        self.is_html
    }

    /// The scripture text for a verse, or for an inclusive verse range when
    /// `end_verse_id` is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVerse` when either id fails canon validation or the
    /// requested verses are not present in this translation.
    pub fn get_scripture(
        &self,
        start_verse_id: u32,
        end_verse_id: Option<u32>,
    ) -> Result<String, BibleError> {
        if !books::is_valid_verse_id(start_verse_id) {
            return Err(BibleError::InvalidVerse(format!(
                "start verse id ({start_verse_id}) is not a valid verse id."
            )));
        }

        if let Some(end_verse_id) = end_verse_id {
            if !books::is_valid_verse_id(end_verse_id) {
                return Err(BibleError::InvalidVerse(format!(
                    "end verse id ({end_verse_id}) is not a valid verse id."
                )));
            }
        }

        let end_verse_id = end_verse_id.unwrap_or(start_verse_id);
        let start = *self.start_indices.get(&start_verse_id).ok_or_else(|| {
            BibleError::InvalidVerse(format!(
                "start verse id ({start_verse_id}) is not in this translation."
            ))
        })?;
        let end = *self.end_indices.get(&end_verse_id).ok_or_else(|| {
            BibleError::InvalidVerse(format!(
                "end verse id ({end_verse_id}) is not in this translation."
            ))
        })?;

        let raw = self.content.get(start..end).ok_or_else(|| {
            BibleError::InvalidVerse(format!(
                "verse range ({start_verse_id}, {end_verse_id}) is out of bounds."
            ))
        })?;

        Ok(if self.is_html {
            clean_html(raw)
        } else {
            raw.trim().to_string()
        })
    }
}

/// Normalise an HTML verse extract into zero or more complete paragraphs:
/// surrounding whitespace and a dangling `<p>` are dropped, missing opening
/// and closing paragraph tags are patched in, and the degenerate leftovers
/// of slicing on paragraph boundaries collapse to the empty string.
///
/// Idempotent: applying it twice gives the same result as applying it once.
#[must_use]
pub fn clean_html(text: &str) -> String {
    let mut text = text.trim().to_string();

    if text.ends_with("<p>") {
        text.truncate(text.len() - "<p>".len());
    }

    if matches!(text.as_str(), "" | "<p>" | "</p>" | "<p></p>" | "</p><p>") {
        return String::new();
    }

    if !text.starts_with("<p>") {
        text.insert_str(0, "<p>");
    }
    if !text.ends_with("</p>") {
        text.push_str("</p>");
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_bible<'a>(
        content: &'a str,
        start_indices: &'a BTreeMap<u32, usize>,
        end_indices: &'a BTreeMap<u32, usize>,
        is_html: bool,
    ) -> Bible<'a> {
        Bible::new(
            Version::KingJames,
            content,
            start_indices,
            end_indices,
            is_html,
        )
    }

    #[test]
    fn get_scripture_single_verse_and_range() {
        let content = "1. In the beginning. 2. And the earth.";
        let starts = BTreeMap::from([(1_001_001, 0), (1_001_002, 20)]);
        let ends = BTreeMap::from([(1_001_001, 20), (1_001_002, content.len())]);
        let bible = sample_bible(content, &starts, &ends, false);

        assert_eq!(
            bible.get_scripture(1_001_001, None).unwrap(),
            "1. In the beginning."
        );
        assert_eq!(
            bible.get_scripture(1_001_001, Some(1_001_002)).unwrap(),
            "1. In the beginning. 2. And the earth."
        );
    }

    #[test]
    fn get_scripture_html_is_patched() {
        let content = "<p><sup>1</sup> Begin.</p>";
        let starts = BTreeMap::from([(1_001_001, 3)]);
        let ends = BTreeMap::from([(1_001_001, content.len())]);
        let bible = sample_bible(content, &starts, &ends, true);

        assert_eq!(
            bible.get_scripture(1_001_001, None).unwrap(),
            "<p><sup>1</sup> Begin.</p>"
        );
    }

    #[test]
    fn get_scripture_rejects_invalid_ids() {
        let content = "";
        let starts = BTreeMap::new();
        let ends = BTreeMap::new();
        let bible = sample_bible(content, &starts, &ends, false);

        // Genesis 100:100 fails canon validation.
        assert!(matches!(
            bible.get_scripture(1_100_100, None),
            Err(BibleError::InvalidVerse(_))
        ));
        // Exodus 1:1 is canonical but absent from this content.
        assert!(matches!(
            bible.get_scripture(2_001_001, None),
            Err(BibleError::InvalidVerse(_))
        ));
        // A bad end id fails even when the start id is fine.
        assert!(matches!(
            bible.get_scripture(2_001_001, Some(1_100_100)),
            Err(BibleError::InvalidVerse(_))
        ));
    }

    #[test]
    fn clean_html_wraps_and_collapses() {
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("   "), "");
        assert_eq!(clean_html("<p></p>"), "");
        assert_eq!(clean_html("</p><p>"), "");
        assert_eq!(clean_html("words<p>"), "<p>words</p>");
        assert_eq!(
            clean_html(" <sup>3</sup> Thou shalt.</p>"),
            "<p><sup>3</sup> Thou shalt.</p>"
        );
        assert_eq!(
            clean_html("<p>Already wrapped.</p>"),
            "<p>Already wrapped.</p>"
        );
    }

    #[test]
    fn version_codes_round_trip() {
        for version in Version::ALL {
            assert_eq!(Version::from_code(version.code()), Some(version));
            assert_eq!(Version::from_code(&version.file_stem()), Some(version));
        }
        assert_eq!(Version::from_code("NIV"), None);
    }

    #[test]
    fn form_names_round_trip() {
        for form in Form::ALL {
            assert_eq!(Form::from_name(form.name()), Some(form));
        }
        assert_eq!(Form::from_name("html-readers"), None);
    }

    proptest! {
        #[test]
        fn prop_clean_html_is_idempotent(input in ".*") {
            let once = clean_html(&input);
            prop_assert_eq!(clean_html(&once), once);
        }
    }
}

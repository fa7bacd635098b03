//! Parser for scripture text in the OSIS XML format.

mod book_parser;
mod util;

pub use self::util::{parse_osis_id, OsisId};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;

use self::book_parser::BookParser;
use crate::books::Book;
use crate::{BibleParser, Form, ParsedBible, RenderedForm, Version};

/// Errors when reading or parsing an OSIS file.
#[derive(Error, Debug)]
pub enum OsisError {
    #[error("OSIS file not readable")]
    MissingOsisFile {
        #[from]
        source: io::Error,
    },

    #[error("malformed XML")]
    MalformedXml {
        #[from]
        source: roxmltree::Error,
    },

    #[error("malformed OSIS id: {0}")]
    MalformedOsisId(String),

    #[error("unknown OSIS book abbreviation: {0}")]
    UnknownBook(String),
}

/// Does the work of parsing a single translation's OSIS XML file into the
/// six rendered forms.
pub struct OsisParser {
    version: Version,
    path: PathBuf,
}

impl OsisParser {
    #[must_use]
    pub fn new(version: Version, path: &Path) -> Self {
        Self {
            version,
            path: path.into(),
        }
    }
}

impl BibleParser for OsisParser {
    type Err = OsisError;

    fn parse(self) -> Result<ParsedBible, Self::Err> {
        let xml = fs::read_to_string(&self.path)?;
        let document = Document::parse(&xml)?;
        let namespace = util::namespace_of(document.root_element());

        let mut forms: [RenderedForm; 6] = Default::default();
        let mut long_titles = BTreeMap::new();
        let mut short_titles = BTreeMap::new();
        let mut max_verses = BTreeMap::new();
        let mut unknown_tags = BTreeSet::new();

        for book in Book::ALL {
            let Some(book_element) = find_book_element(&document, namespace, book) else {
                continue;
            };

            // Seed the book parser with the translation-level lengths emitted
            // so far, so its offsets come out absolute.
            let offsets = Form::ALL.map(|form| forms[form as usize].content.len());
            let mut book_parser = BookParser::new(book_element, offsets);
            book_parser.parse()?;

            for form in Form::ALL {
                let buffer = mem::take(&mut book_parser.buffers[form as usize]);
                let rendered = &mut forms[form as usize];
                rendered.content.push_str(&buffer.text);
                rendered.start_indices.extend(buffer.start_indices);
                rendered.end_indices.extend(buffer.end_indices);
            }

            let title = book_parser.title.trim().to_string();
            long_titles.insert(
                book,
                if title.is_empty() {
                    book.title().to_string()
                } else {
                    title
                },
            );
            short_titles.insert(
                book,
                if book_parser.short_title.is_empty() {
                    book.short_title().to_string()
                } else {
                    book_parser.short_title
                },
            );
            max_verses.insert(book, book_parser.max_verses);
            unknown_tags.extend(book_parser.unknown_tags);
        }

        Ok(ParsedBible::new(
            self.version,
            forms,
            long_titles,
            short_titles,
            max_verses,
            unknown_tags,
        ))
    }
}

fn find_book_element<'a, 'input>(
    document: &'a Document<'input>,
    namespace: Option<&str>,
    book: Book,
) -> Option<Node<'a, 'input>> {
    document.root().descendants().find(|node| {
        node.is_element()
            && util::local_name(*node) == "div"
            && util::namespace_of(*node) == namespace
            && node.attribute("osisID") == Some(book.osis_id())
    })
}

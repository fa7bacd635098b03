use roxmltree::Node;

use super::OsisError;
use crate::books::Book;

/// XML namespace of a node's qualified name, if it has one.
#[must_use]
pub(crate) fn namespace_of<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.tag_name().namespace()
}

/// Local tag name with any namespace stripped.
#[must_use]
pub(crate) fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// The element's direct leading text, with literal newlines replaced by
/// single spaces. Empty string when the element has no leading text.
#[must_use]
pub(crate) fn text_of(node: Node) -> String {
    match node.text() {
        Some(text) => text.replace('\n', " "),
        None => String::new(),
    }
}

/// The text following the element's closing tag, before the next sibling
/// element, with the same newline normalisation as [`text_of`].
#[must_use]
pub(crate) fn tail_of(node: Node) -> String {
    node.next_sibling()
        .filter(|sibling| sibling.is_text())
        .and_then(|sibling| sibling.text())
        .map_or_else(String::new, |tail| tail.replace('\n', " "))
}

#[must_use]
pub(crate) fn text_and_tail_of(node: Node) -> String {
    let mut text = text_of(node);
    text.push_str(&tail_of(node));
    text
}

/// A parsed `BOOK.CHAPTER.VERSE` OSIS id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsisId {
    pub book: Book,
    pub chapter: u32,
    pub verse: u32,
}

/// Parse a dotted OSIS id such as `Gen.1.1`.
///
/// # Errors
///
/// Returns `MalformedOsisId` unless the id has exactly three dotted parts
/// with positive numeric chapter and verse segments, and `UnknownBook` when
/// the book abbreviation is not in the canon table.
pub fn parse_osis_id(osis_id: &str) -> Result<OsisId, OsisError> {
    let mut parts = osis_id.split('.');
    let (Some(book_id), Some(chapter), Some(verse), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(OsisError::MalformedOsisId(osis_id.to_string()));
    };

    let book = Book::from_osis_id(book_id)
        .ok_or_else(|| OsisError::UnknownBook(book_id.to_string()))?;
    let chapter = parse_positive(chapter)
        .ok_or_else(|| OsisError::MalformedOsisId(osis_id.to_string()))?;
    let verse = parse_positive(verse)
        .ok_or_else(|| OsisError::MalformedOsisId(osis_id.to_string()))?;

    Ok(OsisId {
        book,
        chapter,
        verse,
    })
}

fn parse_positive(segment: &str) -> Option<u32> {
    segment.parse().ok().filter(|&number| number > 0)
}

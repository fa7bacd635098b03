use std::collections::btree_map;
use std::{cmp, fmt};

use crate::books;
use crate::{Book, RenderedForm};

/// A verse of one rendered form, together with its decoded reference.
#[derive(Debug, Clone, Copy)]
pub struct VerseWithReference<'v> {
    pub verse_id: u32,
    pub book: Book,
    pub chapter: u32,
    pub verse: u32,
    /// Raw rendered text of the verse, surrounding whitespace trimmed.
    pub text: &'v str,
}

impl<'v> cmp::PartialEq for VerseWithReference<'v> {
    fn eq(&self, other: &Self) -> bool {
        self.verse_id == other.verse_id
    }
}

impl<'v> fmt::Display for VerseWithReference<'v> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{} {}:{}\n{}",
            self.book.title(),
            self.chapter,
            self.verse,
            self.text
        )
    }
}

/// Iterator over the verses of one rendered form, in emission order.
#[derive(Debug)]
pub struct VerseIter<'v> {
    form: &'v RenderedForm,
    starts: btree_map::Iter<'v, u32, usize>,
}

impl<'v> VerseIter<'v> {
    pub(crate) fn new(form: &'v RenderedForm) -> Self {
        Self {
            form,
            starts: form.start_indices.iter(),
        }
    }
}

impl<'v> Iterator for VerseIter<'v> {
    type Item = VerseWithReference<'v>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (&verse_id, &start) = self.starts.next()?;
            let Some(&end) = self.form.end_indices.get(&verse_id) else {
                continue;
            };
            let Some((book, chapter, verse)) = books::book_chapter_verse(verse_id) else {
                continue;
            };
            let Some(text) = self.form.content.get(start..end) else {
                continue;
            };

            return Some(VerseWithReference {
                verse_id,
                book,
                chapter,
                verse,
                text: text.trim(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_form() -> RenderedForm {
        RenderedForm {
            content: "\n1. Alpha. 2. Beta.".to_string(),
            start_indices: BTreeMap::from([(1_001_001, 1), (1_001_002, 10)]),
            end_indices: BTreeMap::from([(1_001_001, 10), (1_001_002, 19)]),
        }
    }

    #[test]
    fn iterates_in_emission_order() {
        let form = sample_form();
        let verses: Vec<_> = VerseIter::new(&form).collect();

        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].book, Book::Genesis);
        assert_eq!(verses[0].chapter, 1);
        assert_eq!(verses[0].verse, 1);
        assert_eq!(verses[0].text, "1. Alpha.");
        assert_eq!(verses[1].text, "2. Beta.");
    }

    #[test]
    fn displays_with_reference() {
        let form = sample_form();
        let first = VerseIter::new(&form).next().unwrap();

        assert_eq!(first.to_string(), "Genesis 1:1\n1. Alpha.");
    }

    #[test]
    fn skips_entries_without_end_offsets() {
        let mut form = sample_form();
        form.end_indices.remove(&1_001_001);

        let verses: Vec<_> = VerseIter::new(&form).collect();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse_id, 1_001_002);
    }
}

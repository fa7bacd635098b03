use std::collections::{BTreeMap, BTreeSet};

use roxmltree::Node;

use super::util;
use super::OsisError;
use crate::books;
use crate::Form;

/// Buffer endings that already separate words; no space is injected after
/// them when the next fragment starts with a letter.
const WORD_BREAKS: [&str; 4] = ["</p>", "<br/>", "\n", "["];

/// One of the six output buffers for a single book, plus the verse offset
/// tables recorded against it. Offsets are UTF-8 byte indices into the
/// translation-level buffer, so every position is shifted by `base`, the
/// total length already emitted for this form by earlier books.
#[derive(Debug, Default)]
pub(crate) struct FormBuffer {
    base: usize,
    pub(crate) text: String,
    pub(crate) start_indices: BTreeMap<u32, usize>,
    pub(crate) end_indices: BTreeMap<u32, usize>,
}

impl FormBuffer {
    fn new(base: usize) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    fn offset(&self) -> usize {
        self.base + self.text.len()
    }

    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Append `fragment` with a separating space, unless the buffer is empty
    /// or already ends with something that separates words.
    fn push_spaced(&mut self, fragment: &str) {
        if !self.text.is_empty() && !WORD_BREAKS.iter().any(|b| self.text.ends_with(b)) {
            self.text.push(' ');
        }
        self.text.push_str(fragment);
    }

    fn mark_start(&mut self, verse_id: u32) {
        self.start_indices.insert(verse_id, self.offset());
    }

    fn mark_end(&mut self, verse_id: u32) {
        self.end_indices.insert(verse_id, self.offset());
    }
}

/// The recognised OSIS tag set. Everything else is `Unknown` and only ever
/// recorded for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OsisTag {
    PassThrough,
    Note,
    Rdg,
    Paragraph,
    Chapter,
    Title,
    Verse,
    Seg,
    TextAndTail,
    TransChange,
    Unknown,
}

impl OsisTag {
    fn from_name(name: &str) -> Self {
        match name {
            "div" | "lg" | "l" | "list" | "item" | "divineName" | "q" => Self::PassThrough,
            "note" => Self::Note,
            "rdg" => Self::Rdg,
            "p" => Self::Paragraph,
            "chapter" => Self::Chapter,
            "title" => Self::Title,
            "verse" => Self::Verse,
            "seg" => Self::Seg,
            "w" | "lb" => Self::TextAndTail,
            "transChange" => Self::TransChange,
            _ => Self::Unknown,
        }
    }
}

/// Walks a single book `<div>` subtree and renders it into the six output
/// buffers, recording per-verse start and end offsets as it goes.
pub(crate) struct BookParser<'a, 'input> {
    root: Node<'a, 'input>,
    pub(crate) buffers: [FormBuffer; 6],
    pub(crate) title: String,
    pub(crate) short_title: String,
    current_verse: u32,
    pub(crate) max_verses: BTreeMap<u32, u32>,
    pub(crate) unknown_tags: BTreeSet<String>,
}

impl<'a, 'input> BookParser<'a, 'input> {
    pub(crate) fn new(root: Node<'a, 'input>, offsets: [usize; 6]) -> Self {
        Self {
            root,
            buffers: offsets.map(FormBuffer::new),
            title: String::new(),
            short_title: String::new(),
            current_verse: 0,
            max_verses: BTreeMap::new(),
            unknown_tags: BTreeSet::new(),
        }
    }

    /// Walk the whole subtree, then flush the end offsets of whatever verse
    /// is still open.
    pub(crate) fn parse(&mut self) -> Result<(), OsisError> {
        self.process_element(self.root, false)?;
        self.close_verse();
        Ok(())
    }

    fn process_element(&mut self, node: Node, in_notes: bool) -> Result<(), OsisError> {
        match OsisTag::from_name(util::local_name(node)) {
            OsisTag::PassThrough => {
                self.append_text(&util::text_of(node), in_notes);
                self.process_children(node, in_notes)?;
                self.append_text(&util::tail_of(node), in_notes);
            }
            OsisTag::Note => {
                // Note content is suppressed from the non-notes forms; only
                // the alternate readings below survive, into the notes forms.
                self.process_children(node, true)?;
                self.append_text(&util::tail_of(node), in_notes);
            }
            OsisTag::Rdg => {
                if in_notes {
                    self.append_text(&util::text_of(node), true);
                }
            }
            OsisTag::Paragraph => {
                for form in Form::ALL {
                    self.buffers[form as usize].push(if form.is_html() { "<p>" } else { "\n" });
                }
                self.process_children(node, false)?;
                for form in Form::ALL {
                    if form.is_html() {
                        self.buffers[form as usize].push("</p>");
                    }
                }
            }
            OsisTag::Chapter => {
                self.close_verse();
                self.current_verse = 0;
                self.process_children(node, in_notes)?;
            }
            OsisTag::Title => self.handle_title(node),
            OsisTag::Verse => self.handle_verse(node, in_notes)?,
            OsisTag::Seg => {
                self.process_children(node, in_notes)?;
                self.append_text(&util::tail_of(node), in_notes);
            }
            OsisTag::TextAndTail => {
                self.append_text(&util::text_and_tail_of(node), in_notes);
            }
            OsisTag::TransChange => self.handle_trans_change(node, in_notes)?,
            OsisTag::Unknown => {
                self.unknown_tags.insert(util::local_name(node).to_string());
            }
        }

        Ok(())
    }

    fn process_children(&mut self, node: Node, in_notes: bool) -> Result<(), OsisError> {
        for child in node.children().filter(Node::is_element) {
            self.process_element(child, in_notes)?;
        }
        Ok(())
    }

    fn handle_title(&mut self, node: Node) {
        if !self.title.is_empty() && !self.short_title.is_empty() {
            return;
        }

        self.title = util::text_of(node);
        self.short_title = node.attribute("short").unwrap_or_default().to_string();
    }

    fn handle_verse(&mut self, node: Node, in_notes: bool) -> Result<(), OsisError> {
        match node.attribute("osisID") {
            Some(osis_id) if !osis_id.is_empty() => {
                let osis_id = util::parse_osis_id(osis_id)?;

                self.close_verse();
                self.current_verse =
                    books::verse_id(osis_id.book, osis_id.chapter, osis_id.verse);
                self.open_verse();

                let max = self.max_verses.entry(osis_id.chapter).or_insert(0);
                *max = (*max).max(osis_id.verse);

                self.push_verse_marker(osis_id.verse);
            }
            // An end-verse marker: the outstanding verse stays current.
            _ => {}
        }

        self.append_text(&util::text_of(node), in_notes);
        self.append_text(&util::tail_of(node), in_notes);
        self.process_children(node, in_notes)
    }

    fn push_verse_marker(&mut self, verse_number: u32) {
        let superscript = format!("<sup>{verse_number}</sup>");
        let plain = format!("{verse_number}.");

        for form in Form::ALL {
            if form.is_readers() {
                continue;
            }

            let buffer = &mut self.buffers[form as usize];
            if form.is_html() {
                if !buffer.text.is_empty()
                    && !buffer.text.ends_with("</p>")
                    && !buffer.text.ends_with("<p>")
                    && !buffer.text.ends_with("<br/>")
                {
                    buffer.push(" ");
                }
                buffer.push(&superscript);
            } else {
                if !buffer.text.is_empty() && !buffer.text.ends_with('\n') {
                    buffer.push(" ");
                }
                buffer.push(&plain);
            }
        }
    }

    fn handle_trans_change(&mut self, node: Node, in_notes: bool) -> Result<(), OsisError> {
        self.push_bracket("[", in_notes);
        self.append_text(&util::text_of(node), in_notes);
        self.process_children(node, in_notes)?;
        self.push_bracket("]", in_notes);
        self.append_text(&util::tail_of(node), in_notes);
        Ok(())
    }

    /// Brackets around translator-inserted words go to the scholar and notes
    /// forms; the readers forms get the inner text bare. The opening bracket
    /// always gets a separating space so insertions don't run into the
    /// preceding word.
    fn push_bracket(&mut self, bracket: &str, in_notes: bool) {
        for form in Form::ALL {
            if form.is_readers() || (in_notes && !form.is_notes()) {
                continue;
            }

            let buffer = &mut self.buffers[form as usize];
            if bracket == "[" && !buffer.text.is_empty() {
                buffer.push(" ");
            }
            buffer.push(bracket);
        }
    }

    fn append_text(&mut self, raw: &str, in_notes: bool) {
        // The mojibake form first: stripping the plain pilcrow first would
        // leave the stray "Â" behind.
        let text = raw.replace("Â¶", "").replace('¶', "");
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let needs_space = text.chars().next().is_some_and(char::is_alphabetic);

        for form in Form::ALL {
            if in_notes && !form.is_notes() {
                continue;
            }

            let buffer = &mut self.buffers[form as usize];
            if needs_space {
                buffer.push_spaced(text);
            } else {
                buffer.push(text);
            }
        }
    }

    fn open_verse(&mut self) {
        for buffer in &mut self.buffers {
            buffer.mark_start(self.current_verse);
        }
    }

    fn close_verse(&mut self) {
        if self.current_verse > 0 {
            for buffer in &mut self.buffers {
                buffer.mark_end(self.current_verse);
            }
        }
    }
}

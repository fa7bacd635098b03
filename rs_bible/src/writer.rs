use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::{Book, Form, ParsedBible};

/// Errors when emitting parsed translation artefacts to disk.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("could not write artefact file")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("could not serialize artefact")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// One rendered form bundled with everything a consumer needs for
/// constant-time verse lookup.
#[derive(Serialize)]
struct FormBundle<'a> {
    version: &'a str,
    is_html: bool,
    content: &'a str,
    start_indices: &'a BTreeMap<u32, usize>,
    end_indices: &'a BTreeMap<u32, usize>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    version: &'a str,
    long_titles: &'a BTreeMap<Book, String>,
    short_titles: &'a BTreeMap<Book, String>,
    max_verses: &'a BTreeMap<Book, BTreeMap<u32, u32>>,
}

/// Write the six form bundles plus the title manifest for a parsed
/// translation under `out_dir/<version>/`.
///
/// # Errors
///
/// Propagates file-system and serialization failures.
pub fn write_artifacts(bible: &ParsedBible, out_dir: &Path) -> Result<(), WriteError> {
    let version_folder = out_dir.join(bible.version().file_stem());
    fs::create_dir_all(&version_folder)?;

    let code = bible.version().code();

    for form in Form::ALL {
        let rendered = bible.form(form);
        let bundle = FormBundle {
            version: code,
            is_html: form.is_html(),
            content: &rendered.content,
            start_indices: &rendered.start_indices,
            end_indices: &rendered.end_indices,
        };

        write_json(&version_folder.join(format!("{}.json", form.name())), &bundle)?;
    }

    let manifest = Manifest {
        version: code,
        long_titles: bible.long_titles(),
        short_titles: bible.short_titles(),
        max_verses: bible.all_max_verses(),
    };
    write_json(&version_folder.join("manifest.json"), &manifest)?;

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

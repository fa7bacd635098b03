use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use rand::Rng;
use rs_bible::formatter::{format_passage, PassageOptions};
use rs_bible::writer::write_artifacts;
use rs_bible::{BibleParser, Form, OsisParser, ParsedBible, Version};

fn main() -> Result<()> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .subcommand_required(true)
        .subcommand(
            translation_command("parse")
                .about("Parse an OSIS file and emit the six rendered forms plus index tables")
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .help("Output directory for the emitted artefacts")
                        .default_value("output"),
                ),
        )
        .subcommand(
            translation_command("passage")
                .about("Print a verse or verse range by integer verse id")
                .arg(
                    Arg::new("start")
                        .help("Verse id of the first verse, e.g. 1001001 for Genesis 1:1")
                        .required(true),
                )
                .arg(Arg::new("end").help("Verse id of the last verse (inclusive)"))
                .arg(
                    Arg::new("formatted")
                        .long("formatted")
                        .action(ArgAction::SetTrue)
                        .help("Compose the passage with book titles and chapter headings"),
                ),
        )
        .subcommand(translation_command("random").about("Print a random verse"))
        .subcommand(translation_command("text").about("Print the whole rendered form"))
        .get_matches();

    match matches.subcommand() {
        Some(("parse", submatches)) => {
            let bible = parse_translation(submatches)?;
            let out = submatches.get_one::<String>("out").unwrap();
            write_artifacts(&bible, Path::new(out))
                .with_context(|| format!("unable to write artefacts under {out}"))?;
        }
        Some(("passage", submatches)) => {
            let bible = parse_translation(submatches)?;
            let form = form_arg(submatches)?;
            let start: u32 = submatches
                .get_one::<String>("start")
                .unwrap()
                .parse()
                .context("start must be an integer verse id")?;
            let end: Option<u32> = submatches
                .get_one::<String>("end")
                .map(|raw| raw.parse())
                .transpose()
                .context("end must be an integer verse id")?;

            if submatches.get_flag("formatted") {
                let verse_ids: Vec<u32> = bible
                    .form(form)
                    .start_indices
                    .range(start..=end.unwrap_or(start))
                    .map(|(&verse_id, _)| verse_id)
                    .collect();
                let options = PassageOptions {
                    html: form.is_html(),
                    full_title: true,
                    include_verse_numbers: !form.is_readers(),
                };
                println!("{}", format_passage(&bible, &verse_ids, &options)?);
            } else {
                println!("{}", bible.bible(form).get_scripture(start, end)?);
            }
        }
        Some(("random", submatches)) => {
            let bible = parse_translation(submatches)?;
            let form = form_arg(submatches)?;
            let count = bible.verses(form).count();
            if count == 0 {
                return Err(anyhow!("translation has no verses"));
            }

            let mut rng = rand::thread_rng();
            let pick = rng.gen_range(0..count);
            let verse = bible
                .verses(form)
                .nth(pick)
                .ok_or_else(|| anyhow!("translation has no verses"))?;
            println!("{verse}");
        }
        Some(("text", submatches)) => {
            let bible = parse_translation(submatches)?;
            let form = form_arg(submatches)?;
            println!("{}", bible.form(form).content);
        }
        _ => unreachable!(),
    }

    Ok(())
}

fn translation_command(name: &'static str) -> Command {
    Command::new(name)
        .arg(
            Arg::new("xml")
                .help("Path to the translation's OSIS XML file")
                .required(true),
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Translation version code (KJV, ASV, ...)")
                .default_value("KJV"),
        )
        .arg(
            Arg::new("form")
                .short('f')
                .long("form")
                .help("Rendered form: html, html_readers, html_notes, plain_text, plain_text_readers or plain_text_notes")
                .default_value("plain_text"),
        )
}

fn parse_translation(matches: &ArgMatches) -> Result<ParsedBible> {
    let code = matches.get_one::<String>("version").unwrap();
    let version = Version::from_code(code)
        .ok_or_else(|| anyhow!("unknown translation version code: {code}"))?;

    let xml = matches.get_one::<String>("xml").unwrap();
    let bible = OsisParser::new(version, Path::new(xml))
        .parse()
        .with_context(|| format!("unable to parse OSIS file {xml}"))?;

    Ok(bible)
}

fn form_arg(matches: &ArgMatches) -> Result<Form> {
    let name = matches.get_one::<String>("form").unwrap();
    Form::from_name(name).ok_or_else(|| anyhow!("unknown rendered form: {name}"))
}

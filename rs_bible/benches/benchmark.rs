use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion};
use rs_bible::{BibleParser, Form, OsisParser, Version};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parse kjv sample", |b| {
        b.iter(|| {
            let parser = OsisParser::new(Version::KingJames, Path::new("testdata/kjv.sample.xml"));
            if let Ok(bible) = parser.parse() {
                let _ = bible.verses(Form::PlainText).count();
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use clangd_query::hover;
use clangd_query::lsp::file_uri;

const SAMPLE_HOVER: &str = "```cpp\nvirtual void Update(float delta_time)\n```\n\nType: `void`\n\n@brief Advances the object's simulation state by one tick.\n";

fn bench_hover_parsing(c: &mut Criterion) {
    c.bench_function("hover_parser_parse", |b| {
        b.iter(|| {
            black_box(hover::parse(black_box(SAMPLE_HOVER)));
        });
    });
}

fn bench_signature_formatting(c: &mut Criterion) {
    let signature = "GameObject & GetParent ( ) const";
    c.bench_function("format_signature", |b| {
        b.iter(|| {
            black_box(hover::format::format_signature(black_box(signature)));
        });
    });
}

fn bench_file_uri_conversion(c: &mut Criterion) {
    let path = std::path::Path::new("/project/include/core/game_object.h");
    c.bench_function("file_uri", |b| {
        b.iter(|| {
            black_box(file_uri(black_box(path)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_hover_parsing,
    bench_signature_formatting,
    bench_file_uri_conversion
);
criterion_main!(benches);

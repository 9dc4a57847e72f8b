//! Criterion benchmarks for the sheet parser: tokenize, parse, last-modified scan.

use access_csv::{extract_last_modified, parse, tokenize};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn sample_sheet(rows: usize) -> String {
    let mut text = String::from(
        "Eugene Access Map,,,,,\n\"Last Modified:\",\"10/15/2024 14:05:00\",,,,\n\
         Location,Address,Privacy,Tags,Notes,Lat_Long\n",
    );
    for i in 0..rows {
        text.push_str(&format!(
            "Spot {i},\"{i} Main St, Eugene\",Public,\"Food, WiFi\",\"Ask at the \"\"front\"\" desk\nopen late\",\"44.0{i}, -123.09\"\n"
        ));
    }
    text
}

fn bench_tokenize(c: &mut Criterion) {
    let text = sample_sheet(500);
    let mut g = c.benchmark_group("tokenize");
    g.throughput(Throughput::Bytes(text.len() as u64));
    g.bench_function("500_rows", |b| {
        b.iter(|| black_box(tokenize(black_box(&text))));
    });
    g.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse");
    for rows in [50, 500] {
        let text = sample_sheet(rows);
        g.throughput(Throughput::Elements(rows as u64));
        g.bench_function(format!("{rows}_rows"), |b| {
            b.iter(|| black_box(parse(black_box(&text))));
        });
    }
    g.finish();
}

fn bench_last_modified(c: &mut Criterion) {
    let text = sample_sheet(500);
    let mut g = c.benchmark_group("last_modified");
    g.throughput(Throughput::Elements(1));
    g.bench_function("extract_last_modified", |b| {
        b.iter(|| black_box(extract_last_modified(black_box(&text))));
    });
    g.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_last_modified);
criterion_main!(benches);

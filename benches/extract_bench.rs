//! Benchmarks for script extraction
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use partials::extract_scripts;

fn create_vendor_bundle(scripts: usize) -> String {
    (0..scripts)
        .map(|i| {
            if i % 2 == 0 {
                format!("<script src=\"/lib/vendor-{}.min.js\"></script>\n", i)
            } else {
                format!(
                    "<!-- init {i} -->\n<div class=\"widget\"></div>\n\
                     <script>window.__w{i} = {i};</script>\n"
                )
            }
        })
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_scripts");

    for size in [4, 64, 1024] {
        let html = create_vendor_bundle(size);

        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_function(format!("scripts_{}", size), |b| {
            b.iter(|| extract_scripts(black_box(&html)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);

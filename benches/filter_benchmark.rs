use std::io::Write as _;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filtercore::{Engine, ElementType, Settings};

const SMALL_FILTER_LIST: &str = "\
||doubleclick.net^
||googleadservices.com^
||googlesyndication.com^
";

const LARGE_FILTER_LIST: &str = include_str!("fixtures/sample_filter_list.txt");

fn write_subscription(contents: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("filtercore-bench-{}.txt", contents.len()));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn engine_from(contents: &str) -> Engine {
    let path = write_subscription(contents);
    let mut engine = Engine::new(Settings::default());
    engine.load_subscription(&path, 0).unwrap();
    std::fs::remove_file(&path).ok();
    engine
}

fn benchmark_should_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("should_block");
    let engine = engine_from(LARGE_FILTER_LIST);

    group.bench_function("blocked_url", |b| {
        b.iter(|| {
            engine.should_block(
                black_box("https://example.com/"),
                black_box("https://tracker3.adserver.com/ads/banner.js"),
                ElementType::SCRIPT,
                0,
            )
        })
    });

    group.bench_function("allowed_url", |b| {
        b.iter(|| {
            engine.should_block(
                black_box("https://example.com/"),
                black_box("https://example.com/index.html"),
                ElementType::DOCUMENT,
                0,
            )
        })
    });

    group.bench_function("mixed_urls", |b| {
        let urls = [
            "https://tracker3.adserver.com/ads/1",
            "https://example.com/page",
            "https://analytics7.popunder.io/pagead/js",
            "https://github.com/user/repo",
            "https://pixel12.metrics.net/ad",
        ];
        b.iter(|| {
            for url in &urls {
                black_box(engine.should_block("https://example.com/", url, ElementType::SCRIPT, 0));
            }
        })
    });

    group.finish();
}

fn benchmark_subscription_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscription_loading");

    group.bench_function("load_small_filter_list", |b| {
        b.iter(|| engine_from(black_box(SMALL_FILTER_LIST)))
    });

    group.bench_function("load_large_filter_list", |b| {
        b.iter(|| engine_from(black_box(LARGE_FILTER_LIST)))
    });

    group.finish();
}

fn benchmark_domain_stylesheet(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain_stylesheet");
    let engine = engine_from(LARGE_FILTER_LIST);

    group.bench_function("assemble_for_domain", |b| {
        b.iter(|| engine.domain_stylesheet(black_box("https://sub.tracker3.adserver.com/")))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_should_block,
    benchmark_subscription_loading,
    benchmark_domain_stylesheet
);
criterion_main!(benches);

extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use snipcss_lib::parser::html::create_dom_tree;
use snipcss_lib::Page;

fn large_page() -> String {
    let mut css = String::new();
    for i in 0..500 {
        css.push_str(&format!(".c{i} {{ color: red; }} .c{i}:hover > .x {{ color: red; }}\n"));
    }
    let mut body = String::with_capacity(1_000_000);
    body.push_str(r#"<div id="root">"#);
    for i in 0..2_000 {
        body.push_str(&format!(r#"<div class="c{}"><span class="x">Test</span></div>"#, i % 700));
    }
    body.push_str("</div>");
    format!("<html><head><style>{css}</style></head><body>{body}</body></html>")
}

fn bench_parse_large_document(c: &mut Criterion) {
    let html = large_page();
    c.bench_function("parse_large_document", |b| b.iter(|| create_dom_tree(&html)));
}

fn bench_extract_used_css(c: &mut Criterion) {
    let page = Page::parse(&large_page(), None);
    let root = page.select("#root").unwrap();
    c.bench_function("extract_used_css", |b| b.iter(|| page.extract_used_css(root)));
}

fn bench_extract_deep_nesting(c: &mut Criterion) {
    let mut html = String::from("<style>div div span { color: red; } .nope { color: red; }</style>");
    for _ in 0..500 {
        html.push_str("<div>");
    }
    html.push_str("<span>Content</span>");
    for _ in 0..500 {
        html.push_str("</div>");
    }
    let page = Page::parse(&html, None);
    let root = page.select("div").unwrap();

    c.bench_function("extract_deep_nesting", |b| b.iter(|| page.extract_used_css(root)));
}

criterion_group!(
    benches,
    bench_parse_large_document,
    bench_extract_used_css,
    bench_extract_deep_nesting
);
criterion_main!(benches);

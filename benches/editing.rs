//! Benchmarks for selection edits.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use inkshade::editor::EditorBuffer;

fn bench_wrap_selection(c: &mut Criterion) {
    let text = "hello world\n".repeat(500);
    c.bench_function("wrap_selection", |b| {
        b.iter(|| {
            let mut buffer = EditorBuffer::from_text(&text);
            buffer.set_selection(black_box(2400), black_box(2405));
            buffer.wrap_selection("**", "**")
        })
    });
}

fn bench_indent_selection(c: &mut Criterion) {
    let text = "    line of code\n".repeat(500);
    let end = text.chars().count();
    c.bench_function("indent_selection", |b| {
        b.iter(|| {
            let mut buffer = EditorBuffer::from_text(&text);
            buffer.set_selection(0, black_box(end));
            buffer.handle_tab(false)
        })
    });
}

fn bench_outdent_selection(c: &mut Criterion) {
    let text = "\t\tline of code\n".repeat(500);
    let end = text.chars().count();
    c.bench_function("outdent_selection", |b| {
        b.iter(|| {
            let mut buffer = EditorBuffer::from_text(&text);
            buffer.set_selection(0, black_box(end));
            buffer.handle_tab(true)
        })
    });
}

criterion_group!(
    benches,
    bench_wrap_selection,
    bench_indent_selection,
    bench_outdent_selection
);
criterion_main!(benches);

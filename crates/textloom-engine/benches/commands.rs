use criterion::{Criterion, criterion_group, criterion_main};
use textloom_engine::{History, InsertText, RegionAddr};
mod common;

fn bench_command_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    group.bench_function("insert_undo_redo", |b| {
        let doc = common::generate_document(100, 200);
        let (_, first) = doc.blocks().next().expect("non-empty");
        let addr = RegionAddr::new(first.id(), 0);
        b.iter(|| {
            let mut doc = doc.clone();
            let mut history = History::new();
            history
                .execute(
                    &mut doc,
                    Box::new(InsertText::new(addr, std::hint::black_box(50), "bench")),
                )
                .expect("execute");
            history.undo(&mut doc).expect("undo");
            history.redo(&mut doc).expect("redo");
            std::hint::black_box(doc.version());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_command_cycle);
criterion_main!(benches);

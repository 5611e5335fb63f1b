//! Interpreter benchmarks using Criterion.
//!
//! Run with: `cargo bench --bench interpreter_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tarn::{
    ir::{BinOp, Expr, Function},
    module::{DataSegment, ElemSegment, ExternKind},
    runtime::Runtime,
    types::{FuncType, GlobalType, Limits, Val, ValType},
    Imports, Module,
};

// ── Module builders ───────────────────────────────────────────────────────────

/// fib plus the globals, segments and start function it ships with.
fn fib_module() -> Module {
    let mut m = Module::new();
    let zero = m.import_global("test", "zero", GlobalType::immutable(ValType::I32));
    m.memory = Some(Limits::at_least(2));
    m.table = Some(Limits::at_least(1));
    let fib7 = m.add_global(GlobalType::mutable(ValType::I32), Expr::global(zero));

    let fib = m.add_function(Function::new(
        "fib",
        FuncType::new(&[ValType::I32], &[ValType::I32]),
        vec![],
        Expr::if_else(
            Some(ValType::I32),
            Expr::binary(BinOp::I32LtS, Expr::local(0), Expr::I32Const(2)),
            Expr::local(0),
            Expr::binary(
                BinOp::I32Add,
                Expr::call(0, vec![Expr::binary(BinOp::I32Sub, Expr::local(0), Expr::I32Const(1))]),
                Expr::call(0, vec![Expr::binary(BinOp::I32Sub, Expr::local(0), Expr::I32Const(2))]),
            ),
        ),
    ));
    let init = m.add_function(Function::new(
        "init_fib7",
        FuncType::new(&[], &[]),
        vec![],
        Expr::global_set(fib7, Expr::binary(BinOp::I32Add, Expr::I32Const(8), Expr::I32Const(-1))),
    ));
    m.data_segments.push(DataSegment::new(0, b"test".to_vec()));
    m.data_segments.push(DataSegment::new(65534, b"span".to_vec()));
    m.elem_segments.push(ElemSegment::new(0, vec![fib]));
    m.start = Some(init);
    m.export("fib", ExternKind::Func, fib);
    m
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_fib(c: &mut Criterion) {
    let m = fib_module();
    let imports = Imports::new().global("test", "zero", Val::I32(0));
    let mut inst = Runtime::new().instantiate(&m, &imports).unwrap();

    let mut group = c.benchmark_group("fibonacci");
    for n in [10, 15, 20] {
        group.bench_with_input(BenchmarkId::new("fib", n), &n, |b, &n| {
            b.iter(|| inst.call("fib", &[Val::I32(black_box(n))]).unwrap())
        });
    }
    group.finish();
}

fn bench_instantiate(c: &mut Criterion) {
    let m = fib_module();
    let imports = Imports::new().global("test", "zero", Val::I32(0));
    let rt = Runtime::new();
    c.bench_function("instantiate", |b| {
        b.iter(|| rt.instantiate(black_box(&m), &imports).unwrap())
    });
}

criterion_group!(benches, bench_fib, bench_instantiate);
criterion_main!(benches);

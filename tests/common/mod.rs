//! The fixture module shared by the integration and property tests.
//!
//! Equivalent text form:
//!
//! ```text
//! (module
//!   (import "test" "zero" (global $zero i32))
//!   (memory 2)
//!   (table 1 funcref)
//!   (data (i32.const 0) "test")
//!   (data (i32.const 65534) "span")
//!   (elem (i32.const 0) $fib)
//!   (global $one i32 (i32.const 1))
//!   (global $fib7 (mut i32) (global.get $zero))
//!   (func $fib (param i32) (result i32)
//!     (if (result i32) (i32.lt_s (local.get 0) (i32.const 2))
//!       (then (local.get 0))
//!       (else (i32.add (call $fib (i32.sub (local.get 0) (i32.const 1)))
//!                      (call $fib (i32.sub (local.get 0) (i32.const 2)))))))
//!   (func $init_fib7
//!     (global.set $fib7 (i32.add (i32.const 8) (i32.const -1))))
//!   (start $init_fib7)
//!   (export "fib" (func $fib))
//!   (export "fib7" (global $fib7))
//!   (export "zero" (global $zero))
//!   (export "one" (global $one)))
//! ```

#![allow(dead_code)]

use tarn::{
    ir::{BinOp, Expr, Function},
    module::{DataSegment, ElemSegment, ExternKind},
    types::{FuncType, GlobalType, Limits, Val, ValType},
    Imports, Module,
};

pub const ZERO: u32 = 0;
pub const ONE: u32 = 1;
pub const FIB7: u32 = 2;
pub const FIB: u32 = 0;
pub const INIT_FIB7: u32 = 1;

pub fn fib_body() -> Expr {
    Expr::if_else(
        Some(ValType::I32),
        Expr::binary(BinOp::I32LtS, Expr::local(0), Expr::I32Const(2)),
        Expr::local(0),
        Expr::binary(
            BinOp::I32Add,
            Expr::call(
                FIB,
                vec![Expr::binary(BinOp::I32Sub, Expr::local(0), Expr::I32Const(1))],
            ),
            Expr::call(
                FIB,
                vec![Expr::binary(BinOp::I32Sub, Expr::local(0), Expr::I32Const(2))],
            ),
        ),
    )
}

pub fn fixture() -> Module {
    let mut m = Module::new();
    let zero = m.import_global("test", "zero", GlobalType::immutable(ValType::I32));
    m.memory = Some(Limits::at_least(2));
    m.table = Some(Limits::at_least(1));

    let one = m.add_global(GlobalType::immutable(ValType::I32), Expr::I32Const(1));
    let fib7 = m.add_global(GlobalType::mutable(ValType::I32), Expr::global(zero));

    let fib = m.add_function(Function::new(
        "fib",
        FuncType::new(&[ValType::I32], &[ValType::I32]),
        vec![],
        fib_body(),
    ));
    let init_fib7 = m.add_function(Function::new(
        "init_fib7",
        FuncType::new(&[], &[]),
        vec![],
        Expr::global_set(
            fib7,
            Expr::binary(BinOp::I32Add, Expr::I32Const(8), Expr::I32Const(-1)),
        ),
    ));
    assert_eq!((zero, one, fib7, fib, init_fib7), (ZERO, ONE, FIB7, FIB, INIT_FIB7));

    m.data_segments.push(DataSegment::new(0, b"test".to_vec()));
    m.data_segments.push(DataSegment::new(65534, b"span".to_vec()));
    m.elem_segments.push(ElemSegment::new(0, vec![fib]));
    m.start = Some(init_fib7);

    m.export("fib", ExternKind::Func, fib);
    m.export("fib7", ExternKind::Global, fib7);
    m.export("zero", ExternKind::Global, zero);
    m.export("one", ExternKind::Global, one);
    m
}

pub fn imports(zero: i32) -> Imports {
    Imports::new().global("test", "zero", Val::I32(zero))
}

/// Iterative Fibonacci with the same wrapping i32 arithmetic.
pub fn fib_reference(n: i32) -> i32 {
    let (mut a, mut b) = (0i32, 1i32);
    for _ in 0..n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    a
}

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

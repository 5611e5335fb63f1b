use crate::types::{FuncType, ValType};
use std::sync::Arc;

/// Two-operand operations. Integer arithmetic wraps; comparisons yield i32 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // ── i32 ──────────────────────────────────────────────────────────────────
    I32Add,
    I32Sub,
    I32Mul,
    I32And,
    I32Or,
    I32Xor,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32LeS,
    I32GeS,

    // ── i64 ──────────────────────────────────────────────────────────────────
    I64Add,
    I64Sub,
    I64Mul,
    I64Eq,
    I64Ne,
    I64LtS,

    // ── floats ───────────────────────────────────────────────────────────────
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Eq,
    F32Lt,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Eq,
    F64Lt,
}

/// One-operand operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    I32Eqz,
    I64Eqz,
    I32WrapI64,
    I64ExtendI32S,
}

/// Memory access width for loads and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    /// `i32.load` / `i32.store`
    I32,
    /// `i32.load8_u` / `i32.store8`
    I32U8,
    /// `i64.load` / `i64.store`
    I64,
}

/// A node of a function body.
///
/// Bodies are expression trees: every node evaluates its operands left to
/// right, then applies itself. Nodes such as `GlobalSet` or `Store` produce
/// no value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // ── Constants ────────────────────────────────────────────────────────────
    I32Const(i32),
    I64Const(i64),
    F32Const(f32),
    F64Const(f64),

    // ── Locals / globals ─────────────────────────────────────────────────────
    LocalGet(u32),
    LocalSet(u32, Box<Expr>),
    GlobalGet(u32),
    GlobalSet(u32, Box<Expr>),

    // ── Numeric ──────────────────────────────────────────────────────────────
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),

    // ── Memory ───────────────────────────────────────────────────────────────
    Load {
        op: MemOp,
        offset: u32,
        addr: Box<Expr>,
    },
    Store {
        op: MemOp,
        offset: u32,
        addr: Box<Expr>,
        value: Box<Expr>,
    },
    MemorySize,
    MemoryGrow(Box<Expr>),

    // ── Control ──────────────────────────────────────────────────────────────
    Nop,
    Unreachable,
    Drop(Box<Expr>),
    /// Evaluates each expression in turn; the last one is the value.
    Block(Vec<Expr>),
    If {
        result: Option<ValType>,
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },

    // ── Calls ────────────────────────────────────────────────────────────────
    Call(u32, Vec<Expr>),
    CallIndirect {
        ty: FuncType,
        slot: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn local(idx: u32) -> Expr {
        Expr::LocalGet(idx)
    }

    pub fn global(idx: u32) -> Expr {
        Expr::GlobalGet(idx)
    }

    pub fn global_set(idx: u32, value: Expr) -> Expr {
        Expr::GlobalSet(idx, Box::new(value))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn call(func: u32, args: Vec<Expr>) -> Expr {
        Expr::Call(func, args)
    }

    pub fn if_else(result: Option<ValType>, cond: Expr, then: Expr, els: Expr) -> Expr {
        Expr::If {
            result,
            cond: Box::new(cond),
            then: Box::new(then),
            els: Box::new(els),
        }
    }

    pub fn load(op: MemOp, offset: u32, addr: Expr) -> Expr {
        Expr::Load {
            op,
            offset,
            addr: Box::new(addr),
        }
    }

    pub fn store(op: MemOp, offset: u32, addr: Expr, value: Expr) -> Expr {
        Expr::Store {
            op,
            offset,
            addr: Box::new(addr),
            value: Box::new(value),
        }
    }

    /// Whether this tree may serve as a constant initializer: constants,
    /// `global.get` of an index accepted by `is_global_ok`, and integer
    /// add/sub over such operands.
    pub fn is_const(&self, is_global_ok: &dyn Fn(u32) -> bool) -> bool {
        match self {
            Expr::I32Const(_) | Expr::I64Const(_) | Expr::F32Const(_) | Expr::F64Const(_) => true,
            Expr::GlobalGet(idx) => is_global_ok(*idx),
            Expr::Binary(
                BinOp::I32Add | BinOp::I32Sub | BinOp::I64Add | BinOp::I64Sub,
                lhs,
                rhs,
            ) => lhs.is_const(is_global_ok) && rhs.is_const(is_global_ok),
            _ => false,
        }
    }
}

/// A function definition: signature, extra locals and a body tree.
///
/// `body` sits behind an `Arc` so a `Function` can be cloned into call frames
/// without copying the tree.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub ty: FuncType,
    pub locals: Vec<ValType>, // extra locals beyond params
    pub body: Arc<Expr>,
}

impl Function {
    pub fn new(name: impl Into<String>, ty: FuncType, locals: Vec<ValType>, body: Expr) -> Self {
        Function {
            name: name.into(),
            ty,
            locals,
            body: Arc::new(body),
        }
    }
}

//! Tree-walking evaluator.
//!
//! Every node evaluates its operands depth-first, left to right, then
//! applies itself. Guest calls recurse on the Rust stack, which `stacker`
//! extends on demand; the depth itself is bounded by the instance's
//! [`CallStack`]. Any ill-typed operand or dangling index traps instead of
//! producing a value.

use crate::{
    imports::HostFunc,
    instance::{FuncRef, Store},
    ir::{BinOp, Expr, Function, MemOp, UnOp},
    memory::Memory,
    module::Module,
    stack::CallStack,
    trap::{Result, Trap},
    types::{Val, ValType},
};

/// Remaining host stack below which evaluation switches segments.
const RED_ZONE: usize = 128 * 1024;
/// Size of each additional stack segment.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

enum Callee<'m> {
    Host(HostFunc),
    Defined(&'m Function),
}

pub(crate) struct Interpreter<'a, 'm> {
    module: &'m Module,
    store: &'a mut Store,
    stack: &'a mut CallStack,
    memory_cap: u32,
}

impl<'a, 'm> Interpreter<'a, 'm> {
    pub(crate) fn new(
        module: &'m Module,
        store: &'a mut Store,
        stack: &'a mut CallStack,
        memory_cap: u32,
    ) -> Self {
        Interpreter {
            module,
            store,
            stack,
            memory_cap,
        }
    }

    /// Call any function of the instance by index.
    pub(crate) fn call(&mut self, idx: u32, args: &[Val]) -> Result<Option<Val>> {
        let module = self.module;
        let callee = match self.store.funcs.get(idx as usize) {
            Some(FuncRef::Host(host)) => Callee::Host(host.clone()),
            Some(FuncRef::Defined(i)) => Callee::Defined(
                module
                    .functions
                    .get(*i)
                    .ok_or(Trap::UndefinedFunction(idx))?,
            ),
            None => return Err(Trap::UndefinedFunction(idx)),
        };
        tracing::trace!(func = idx, depth = self.stack.depth(), "call");

        match callee {
            Callee::Host(host) => {
                if !host.ty.accepts(args) {
                    return Err(Trap::TypeMismatch);
                }
                self.stack.enter()?;
                let result = (host.func)(args);
                self.stack.exit();
                check_result(host.ty.result(), result?)
            }
            Callee::Defined(func) => self.invoke(func, args),
        }
    }

    fn invoke(&mut self, func: &'m Function, args: &[Val]) -> Result<Option<Val>> {
        if !func.ty.accepts(args) {
            return Err(Trap::TypeMismatch);
        }
        self.stack.enter()?;

        let mut locals: Vec<Val> = Vec::with_capacity(args.len() + func.locals.len());
        locals.extend_from_slice(args);
        locals.extend(func.locals.iter().map(|&ty| Val::default_for(ty)));

        let result = self.eval(&func.body, &mut locals);
        self.stack.exit();
        check_result(func.ty.result(), result?)
    }

    /// Evaluate a constant initializer (no locals, no calls).
    pub(crate) fn eval_const(&mut self, expr: &Expr) -> Result<Val> {
        self.value(expr, &mut Vec::new())
    }

    /// Evaluate a node that must produce a value.
    fn value(&mut self, expr: &Expr, locals: &mut Vec<Val>) -> Result<Val> {
        self.eval(expr, locals)?.ok_or(Trap::TypeMismatch)
    }

    fn i32_value(&mut self, expr: &Expr, locals: &mut Vec<Val>) -> Result<i32> {
        self.value(expr, locals)?.as_i32().ok_or(Trap::TypeMismatch)
    }

    /// Evaluate one node. Runs on a fresh stack segment when the current one
    /// is nearly exhausted, so only `CallStack` bounds guest recursion.
    fn eval(&mut self, expr: &Expr, locals: &mut Vec<Val>) -> Result<Option<Val>> {
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || self.eval_node(expr, locals))
    }

    fn eval_node(&mut self, expr: &Expr, locals: &mut Vec<Val>) -> Result<Option<Val>> {
        let val = match expr {
            // ── Constants ─────────────────────────────────────────────────────
            Expr::I32Const(v) => Val::I32(*v),
            Expr::I64Const(v) => Val::I64(*v),
            Expr::F32Const(v) => Val::F32(*v),
            Expr::F64Const(v) => Val::F64(*v),

            // ── Locals / globals ──────────────────────────────────────────────
            Expr::LocalGet(i) => *locals.get(*i as usize).ok_or(Trap::UndefinedLocal(*i))?,
            Expr::LocalSet(i, value) => {
                let v = self.value(value, locals)?;
                let slot = locals
                    .get_mut(*i as usize)
                    .ok_or(Trap::UndefinedLocal(*i))?;
                if slot.ty() != v.ty() {
                    return Err(Trap::TypeMismatch);
                }
                *slot = v;
                return Ok(None);
            }
            Expr::GlobalGet(i) => self.store.globals.get(*i)?,
            Expr::GlobalSet(i, value) => {
                let v = self.value(value, locals)?;
                self.store.globals.set(*i, v)?;
                return Ok(None);
            }

            // ── Numeric ───────────────────────────────────────────────────────
            Expr::Unary(op, operand) => {
                let v = self.value(operand, locals)?;
                unary(*op, v)?
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.value(lhs, locals)?;
                let b = self.value(rhs, locals)?;
                binary(*op, a, b)?
            }

            // ── Memory ────────────────────────────────────────────────────────
            Expr::Load { op, offset, addr } => {
                let base = self.i32_value(addr, locals)?;
                let memory = self.memory()?;
                let ea = effective_address(base, *offset, width(*op))?;
                match op {
                    MemOp::I32 => Val::I32(memory.read_u32(ea)? as i32),
                    MemOp::I32U8 => Val::I32(memory.read_u8(ea)? as i32),
                    MemOp::I64 => Val::I64(memory.read_u64(ea)? as i64),
                }
            }
            Expr::Store {
                op,
                offset,
                addr,
                value,
            } => {
                let base = self.i32_value(addr, locals)?;
                let v = self.value(value, locals)?;
                let ea = effective_address(base, *offset, width(*op))?;
                let memory = self.memory_mut()?;
                match (op, v) {
                    (MemOp::I32, Val::I32(x)) => memory.write_u32(ea, x as u32)?,
                    (MemOp::I32U8, Val::I32(x)) => memory.write_u8(ea, x as u8)?,
                    (MemOp::I64, Val::I64(x)) => memory.write_u64(ea, x as u64)?,
                    _ => return Err(Trap::TypeMismatch),
                }
                return Ok(None);
            }
            Expr::MemorySize => Val::I32(self.memory()?.pages() as i32),
            Expr::MemoryGrow(delta) => {
                let delta = self.i32_value(delta, locals)? as u32;
                let cap = self.memory_cap;
                let old = self.memory_mut()?.grow(delta, cap);
                Val::I32(old.map(|pages| pages as i32).unwrap_or(-1))
            }

            // ── Control ───────────────────────────────────────────────────────
            Expr::Nop => return Ok(None),
            Expr::Unreachable => return Err(Trap::Unreachable),
            Expr::Drop(inner) => {
                self.eval(inner, locals)?;
                return Ok(None);
            }
            Expr::Block(body) => {
                let mut last = None;
                for e in body {
                    last = self.eval(e, locals)?;
                }
                return Ok(last);
            }
            Expr::If {
                result,
                cond,
                then,
                els,
            } => {
                let branch = if self.i32_value(cond, locals)? != 0 { then } else { els };
                let v = self.eval(branch, locals)?;
                return check_result(*result, v);
            }

            // ── Calls ─────────────────────────────────────────────────────────
            Expr::Call(idx, args) => {
                let vals = args
                    .iter()
                    .map(|a| self.value(a, locals))
                    .collect::<Result<Vec<_>>>()?;
                return self.call(*idx, &vals);
            }
            Expr::CallIndirect { ty, slot, args } => {
                let vals = args
                    .iter()
                    .map(|a| self.value(a, locals))
                    .collect::<Result<Vec<_>>>()?;
                let slot = self.i32_value(slot, locals)? as u32;
                let table = self.store.table.as_ref().ok_or(Trap::MissingTable)?;
                let func = table.get(slot)?.ok_or(Trap::UninitializedElement(slot))?;
                let actual = self
                    .module
                    .func_type(func)
                    .ok_or(Trap::UndefinedFunction(func))?;
                if actual != ty {
                    return Err(Trap::IndirectCallSignature);
                }
                return self.call(func, &vals);
            }
        };
        Ok(Some(val))
    }

    fn memory(&self) -> Result<&Memory> {
        self.store.memory.as_ref().ok_or(Trap::MissingMemory)
    }

    fn memory_mut(&mut self) -> Result<&mut Memory> {
        self.store.memory.as_mut().ok_or(Trap::MissingMemory)
    }
}

/// Compare a produced value against the declared result type.
fn check_result(expected: Option<ValType>, value: Option<Val>) -> Result<Option<Val>> {
    match (expected, value) {
        (None, None) => Ok(None),
        (Some(ty), Some(v)) if v.ty() == ty => Ok(Some(v)),
        _ => Err(Trap::TypeMismatch),
    }
}

fn width(op: MemOp) -> usize {
    match op {
        MemOp::I32 => 4,
        MemOp::I32U8 => 1,
        MemOp::I64 => 8,
    }
}

/// Base address is an unsigned 32-bit value; the static offset is added
/// without wrapping.
fn effective_address(base: i32, offset: u32, len: usize) -> Result<usize> {
    let ea = base as u32 as u64 + offset as u64;
    usize::try_from(ea).map_err(|_| Trap::MemoryAccess { offset: ea, len })
}

pub(crate) fn unary(op: UnOp, v: Val) -> Result<Val> {
    Ok(match (op, v) {
        (UnOp::I32Eqz, Val::I32(a)) => Val::from_bool(a == 0),
        (UnOp::I64Eqz, Val::I64(a)) => Val::from_bool(a == 0),
        (UnOp::I32WrapI64, Val::I64(a)) => Val::I32(a as i32),
        (UnOp::I64ExtendI32S, Val::I32(a)) => Val::I64(a as i64),
        _ => return Err(Trap::TypeMismatch),
    })
}

pub(crate) fn binary(op: BinOp, a: Val, b: Val) -> Result<Val> {
    use BinOp::*;
    use Val::{F32, F64, I32, I64};

    Ok(match (op, a, b) {
        // ── i32 ───────────────────────────────────────────────────────────────
        (I32Add, I32(a), I32(b)) => I32(a.wrapping_add(b)),
        (I32Sub, I32(a), I32(b)) => I32(a.wrapping_sub(b)),
        (I32Mul, I32(a), I32(b)) => I32(a.wrapping_mul(b)),
        (I32And, I32(a), I32(b)) => I32(a & b),
        (I32Or, I32(a), I32(b)) => I32(a | b),
        (I32Xor, I32(a), I32(b)) => I32(a ^ b),
        (I32Eq, I32(a), I32(b)) => Val::from_bool(a == b),
        (I32Ne, I32(a), I32(b)) => Val::from_bool(a != b),
        (I32LtS, I32(a), I32(b)) => Val::from_bool(a < b),
        (I32LtU, I32(a), I32(b)) => Val::from_bool((a as u32) < (b as u32)),
        (I32GtS, I32(a), I32(b)) => Val::from_bool(a > b),
        (I32LeS, I32(a), I32(b)) => Val::from_bool(a <= b),
        (I32GeS, I32(a), I32(b)) => Val::from_bool(a >= b),

        // ── i64 ───────────────────────────────────────────────────────────────
        (I64Add, I64(a), I64(b)) => I64(a.wrapping_add(b)),
        (I64Sub, I64(a), I64(b)) => I64(a.wrapping_sub(b)),
        (I64Mul, I64(a), I64(b)) => I64(a.wrapping_mul(b)),
        (I64Eq, I64(a), I64(b)) => Val::from_bool(a == b),
        (I64Ne, I64(a), I64(b)) => Val::from_bool(a != b),
        (I64LtS, I64(a), I64(b)) => Val::from_bool(a < b),

        // ── floats ────────────────────────────────────────────────────────────
        (F32Add, F32(a), F32(b)) => F32(a + b),
        (F32Sub, F32(a), F32(b)) => F32(a - b),
        (F32Mul, F32(a), F32(b)) => F32(a * b),
        (F32Div, F32(a), F32(b)) => F32(a / b),
        (F32Eq, F32(a), F32(b)) => Val::from_bool(a == b),
        (F32Lt, F32(a), F32(b)) => Val::from_bool(a < b),
        (F64Add, F64(a), F64(b)) => F64(a + b),
        (F64Sub, F64(a), F64(b)) => F64(a - b),
        (F64Mul, F64(a), F64(b)) => F64(a * b),
        (F64Div, F64(a), F64(b)) => F64(a / b),
        (F64Eq, F64(a), F64(b)) => Val::from_bool(a == b),
        (F64Lt, F64(a), F64(b)) => Val::from_bool(a < b),

        _ => return Err(Trap::TypeMismatch),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(
            binary(BinOp::I32Add, Val::I32(i32::MAX), Val::I32(1)),
            Ok(Val::I32(i32::MIN))
        );
        assert_eq!(
            binary(BinOp::I32Sub, Val::I32(i32::MIN), Val::I32(1)),
            Ok(Val::I32(i32::MAX))
        );
        assert_eq!(
            binary(BinOp::I64Mul, Val::I64(i64::MAX), Val::I64(2)),
            Ok(Val::I64(-2))
        );
    }

    #[test]
    fn comparisons_yield_i32_booleans() {
        assert_eq!(binary(BinOp::I32LtS, Val::I32(-1), Val::I32(2)), Ok(Val::I32(1)));
        assert_eq!(binary(BinOp::I32LtU, Val::I32(-1), Val::I32(2)), Ok(Val::I32(0)));
        assert_eq!(binary(BinOp::I64LtS, Val::I64(3), Val::I64(2)), Ok(Val::I32(0)));
        assert_eq!(binary(BinOp::F64Lt, Val::F64(0.5), Val::F64(1.0)), Ok(Val::I32(1)));
    }

    #[test]
    fn mixed_operands_trap() {
        assert_eq!(
            binary(BinOp::I32Add, Val::I32(1), Val::I64(1)),
            Err(Trap::TypeMismatch)
        );
        assert_eq!(unary(UnOp::I32Eqz, Val::F32(0.0)), Err(Trap::TypeMismatch));
    }

    #[test]
    fn conversions() {
        assert_eq!(unary(UnOp::I32WrapI64, Val::I64(1 << 32 | 5)), Ok(Val::I32(5)));
        assert_eq!(unary(UnOp::I64ExtendI32S, Val::I32(-3)), Ok(Val::I64(-3)));
        assert_eq!(unary(UnOp::I64Eqz, Val::I64(0)), Ok(Val::I32(1)));
    }

    #[test]
    fn effective_address_does_not_wrap() {
        assert_eq!(effective_address(-1, 1, 4), Ok(u32::MAX as usize + 1));
        assert_eq!(effective_address(8, 4, 4), Ok(12));
    }

    #[test]
    fn result_types_are_checked() {
        assert_eq!(check_result(None, None), Ok(None));
        assert_eq!(
            check_result(Some(ValType::I32), Some(Val::I32(1))),
            Ok(Some(Val::I32(1)))
        );
        assert_eq!(check_result(Some(ValType::I32), None), Err(Trap::TypeMismatch));
        assert_eq!(
            check_result(None, Some(Val::I32(1))),
            Err(Trap::TypeMismatch)
        );
    }
}

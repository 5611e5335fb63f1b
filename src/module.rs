//! Module declarations.
//!
//! A [`Module`] is a plain, immutable description: nothing in it is
//! allocated or executed until it is instantiated. Function and global
//! indices follow the usual layout where imported entries come first,
//! followed by the module's own definitions, so imports must be declared
//! before anything that refers to them by index.

use crate::{
    ir::{Expr, Function},
    trap::InstantiationError,
    types::{FuncType, GlobalType, Limits, ValType},
};
use std::collections::HashSet;

// ── Declarations ─────────────────────────────────────────────────────────────

/// What an import is expected to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDesc {
    Func(FuncType),
    Global(GlobalType),
}

/// An item the host must supply at instantiation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub desc: ImportDesc,
}

/// A global defined by the module, with a constant initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDef {
    pub ty: GlobalType,
    pub init: Expr,
}

/// Bytes copied into memory at a constant offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub offset: Expr,
    pub bytes: Vec<u8>,
}

impl DataSegment {
    pub fn new(offset: u32, bytes: impl Into<Vec<u8>>) -> Self {
        DataSegment {
            offset: Expr::I32Const(offset as i32),
            bytes: bytes.into(),
        }
    }
}

/// Function indices copied into the table at a constant offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ElemSegment {
    pub offset: Expr,
    pub funcs: Vec<u32>,
}

impl ElemSegment {
    pub fn new(offset: u32, funcs: Vec<u32>) -> Self {
        ElemSegment {
            offset: Expr::I32Const(offset as i32),
            funcs,
        }
    }
}

/// Kind of an exported item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternKind {
    Func,
    Global,
    Memory,
    Table,
}

/// A name under which an item is reachable from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExternKind,
    pub index: u32,
}

// ── Module ───────────────────────────────────────────────────────────────────

/// A module definition, ready to be instantiated any number of times.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub imports: Vec<Import>,
    /// Functions defined in this module (after imported functions).
    pub functions: Vec<Function>,
    /// Globals defined in this module (after imported globals).
    pub globals: Vec<GlobalDef>,
    /// Linear memory size in pages, if any.
    pub memory: Option<Limits>,
    /// Table size in slots, if any.
    pub table: Option<Limits>,
    pub data_segments: Vec<DataSegment>,
    pub elem_segments: Vec<ElemSegment>,
    /// Function run once at the end of instantiation.
    pub start: Option<u32>,
    pub exports: Vec<Export>,
}

impl Module {
    /// Create an empty module (used by the builder API).
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builder helpers ──────────────────────────────────────────────────────

    /// Declare a global import. Returns its global index.
    pub fn import_global(
        &mut self,
        module: impl Into<String>,
        field: impl Into<String>,
        ty: GlobalType,
    ) -> u32 {
        self.imports.push(Import {
            module: module.into(),
            field: field.into(),
            desc: ImportDesc::Global(ty),
        });
        self.num_imported_globals() - 1
    }

    /// Declare a function import. Returns its function index.
    pub fn import_func(
        &mut self,
        module: impl Into<String>,
        field: impl Into<String>,
        ty: FuncType,
    ) -> u32 {
        self.imports.push(Import {
            module: module.into(),
            field: field.into(),
            desc: ImportDesc::Func(ty),
        });
        self.num_imported_funcs() - 1
    }

    /// Define a global. Returns its global index.
    pub fn add_global(&mut self, ty: GlobalType, init: Expr) -> u32 {
        self.globals.push(GlobalDef { ty, init });
        self.global_count() - 1
    }

    /// Define a function. Returns its function index.
    pub fn add_function(&mut self, func: Function) -> u32 {
        self.functions.push(func);
        self.func_count() - 1
    }

    pub fn export(&mut self, name: impl Into<String>, kind: ExternKind, index: u32) {
        self.exports.push(Export {
            name: name.into(),
            kind,
            index,
        });
    }

    // ── Index spaces ─────────────────────────────────────────────────────────

    pub fn num_imported_funcs(&self) -> u32 {
        self.imports
            .iter()
            .filter(|i| matches!(i.desc, ImportDesc::Func(_)))
            .count() as u32
    }

    pub fn num_imported_globals(&self) -> u32 {
        self.imports
            .iter()
            .filter(|i| matches!(i.desc, ImportDesc::Global(_)))
            .count() as u32
    }

    pub fn func_count(&self) -> u32 {
        self.num_imported_funcs() + self.functions.len() as u32
    }

    pub fn global_count(&self) -> u32 {
        self.num_imported_globals() + self.globals.len() as u32
    }

    /// Signature of any function in the index space.
    pub fn func_type(&self, idx: u32) -> Option<&FuncType> {
        let imported = self.imports.iter().filter_map(|i| match &i.desc {
            ImportDesc::Func(ty) => Some(ty),
            ImportDesc::Global(_) => None,
        });
        imported
            .chain(self.functions.iter().map(|f| &f.ty))
            .nth(idx as usize)
    }

    /// Type of any global in the index space.
    pub fn global_type(&self, idx: u32) -> Option<GlobalType> {
        let imported = self.imports.iter().filter_map(|i| match &i.desc {
            ImportDesc::Global(ty) => Some(*ty),
            ImportDesc::Func(_) => None,
        });
        imported
            .chain(self.globals.iter().map(|g| g.ty))
            .nth(idx as usize)
    }

    /// Find an export by name.
    pub fn find_export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    // ── Validation ───────────────────────────────────────────────────────────

    /// Check that every index the module refers to resolves, that export
    /// names are unique and that initializers are constant.
    pub fn validate(&self) -> Result<(), InstantiationError> {
        let invalid = |msg: String| Err(InstantiationError::InvalidModule(msg));
        let n_funcs = self.func_count();
        let n_imported_globals = self.num_imported_globals();
        let imported_global = |idx: u32| idx < n_imported_globals;

        for (what, limits) in [("memory", self.memory), ("table", self.table)] {
            if let Some(limits) = limits.filter(|l| !l.is_valid()) {
                return invalid(format!(
                    "{what} minimum {} exceeds maximum {}",
                    limits.min,
                    limits.max.unwrap_or_default()
                ));
            }
        }

        for (i, global) in self.globals.iter().enumerate() {
            if !global.init.is_const(&imported_global) {
                return invalid(format!("initializer of global {i} is not constant"));
            }
            if let Some(ty) = self.const_type(&global.init) {
                if ty != global.ty.ty {
                    return invalid(format!(
                        "initializer of global {i} has type {ty}, expected {}",
                        global.ty.ty
                    ));
                }
            }
        }

        if !self.data_segments.is_empty() && self.memory.is_none() {
            return invalid("data segment without memory".into());
        }
        for (i, seg) in self.data_segments.iter().enumerate() {
            if !seg.offset.is_const(&imported_global) {
                return invalid(format!("offset of data segment {i} is not constant"));
            }
        }

        if !self.elem_segments.is_empty() && self.table.is_none() {
            return invalid("element segment without table".into());
        }
        for (i, seg) in self.elem_segments.iter().enumerate() {
            if !seg.offset.is_const(&imported_global) {
                return invalid(format!("offset of element segment {i} is not constant"));
            }
            if let Some(bad) = seg.funcs.iter().find(|&&f| f >= n_funcs) {
                return invalid(format!("element segment {i} refers to function {bad}"));
            }
        }

        if let Some(start) = self.start {
            match self.func_type(start) {
                None => return invalid(format!("start function {start} not found")),
                Some(ty) if !ty.params.is_empty() => {
                    return invalid(format!("start function {start} takes parameters"))
                }
                Some(_) => {}
            }
        }

        let mut names = HashSet::new();
        for export in &self.exports {
            if !names.insert(export.name.as_str()) {
                return invalid(format!("duplicate export {:?}", export.name));
            }
            let resolves = match export.kind {
                ExternKind::Func => export.index < n_funcs,
                ExternKind::Global => export.index < self.global_count(),
                ExternKind::Memory => export.index == 0 && self.memory.is_some(),
                ExternKind::Table => export.index == 0 && self.table.is_some(),
            };
            if !resolves {
                return invalid(format!(
                    "export {:?} refers to missing {:?} {}",
                    export.name, export.kind, export.index
                ));
            }
        }

        Ok(())
    }

    /// Static type of a constant expression, when it can be determined.
    fn const_type(&self, expr: &Expr) -> Option<ValType> {
        match expr {
            Expr::I32Const(_) => Some(ValType::I32),
            Expr::I64Const(_) => Some(ValType::I64),
            Expr::F32Const(_) => Some(ValType::F32),
            Expr::F64Const(_) => Some(ValType::F64),
            Expr::GlobalGet(idx) => self.global_type(*idx).map(|g| g.ty),
            Expr::Binary(_, lhs, _) => self.const_type(lhs),
            _ => None,
        }
    }
}

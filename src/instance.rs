//! Instantiation and the host-facing surface of a live instance.
//!
//! [`Instance::new`] performs the instantiation steps strictly in order:
//!
//! 1. validate the module and resolve every import against the host
//!    environment;
//! 2. allocate linear memory and the table, zero/null filled;
//! 3. initialize globals, imported ones first;
//! 4. copy data segments into memory, then element segments into the table;
//! 5. run the start function, if any, exactly once;
//! 6. build the export map.
//!
//! Any failure aborts instantiation and no instance is returned.

use std::collections::HashMap;

use crate::{
    global::GlobalStore,
    imports::{Extern, HostFunc, Imports},
    interpreter::Interpreter,
    memory::Memory,
    module::{ExternKind, ImportDesc, Module},
    runtime::Config,
    stack::CallStack,
    table::Table,
    trap::{InstantiationError, Result, Trap},
    types::Val,
};

// ── Store (per-instance state) ────────────────────────────────────────────────

/// An entry of the instance's function index space.
#[derive(Debug, Clone)]
pub(crate) enum FuncRef {
    Host(HostFunc),
    /// Index into `Module::functions`.
    Defined(usize),
}

/// Mutable state exclusively owned by one instance.
#[derive(Debug)]
pub(crate) struct Store {
    pub funcs: Vec<FuncRef>,
    pub globals: GlobalStore,
    pub memory: Option<Memory>,
    pub table: Option<Table>,
}

// ── Instance ──────────────────────────────────────────────────────────────────

/// A live instantiation of a module.
///
/// Borrows the module it was created from; any number of instances may share
/// one module, each with its own memory, table and globals.
#[derive(Debug)]
pub struct Instance<'m> {
    module: &'m Module,
    store: Store,
    stack: CallStack,
    config: Config,
    exports: HashMap<String, (ExternKind, u32)>,
}

impl<'m> Instance<'m> {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            imports = module.imports.len(),
            functions = module.functions.len(),
            globals = module.globals.len()
        )
    )]
    pub fn new(
        module: &'m Module,
        imports: &Imports,
        config: Config,
    ) -> std::result::Result<Self, InstantiationError> {
        module.validate()?;

        tracing::trace!("resolving imports");
        let mut funcs = Vec::with_capacity(module.func_count() as usize);
        let mut imported_globals = Vec::new();
        for import in &module.imports {
            let item = imports.get(&import.module, &import.field).ok_or_else(|| {
                InstantiationError::unresolved(&import.module, &import.field, "not provided")
            })?;
            match (&import.desc, item) {
                (ImportDesc::Global(ty), Extern::Global(value)) => {
                    if value.ty() != ty.ty {
                        return Err(InstantiationError::unresolved(
                            &import.module,
                            &import.field,
                            format!("expected {} global, found {}", ty.ty, value.ty()),
                        ));
                    }
                    imported_globals.push((*ty, *value));
                }
                (ImportDesc::Func(ty), Extern::Func(host)) => {
                    if host.ty != *ty {
                        return Err(InstantiationError::unresolved(
                            &import.module,
                            &import.field,
                            format!("expected function {ty}, found {}", host.ty),
                        ));
                    }
                    funcs.push(FuncRef::Host(host.clone()));
                }
                (desc, item) => {
                    let expected = match desc {
                        ImportDesc::Global(_) => "global",
                        ImportDesc::Func(_) => "function",
                    };
                    return Err(InstantiationError::unresolved(
                        &import.module,
                        &import.field,
                        format!("expected {expected}, found {}", item.kind_name()),
                    ));
                }
            }
        }
        funcs.extend((0..module.functions.len()).map(FuncRef::Defined));

        tracing::trace!(memory = ?module.memory, table = ?module.table, "allocating");
        let memory = match module.memory {
            Some(limits) if limits.min > config.max_memory_pages => {
                return Err(InstantiationError::ResourceLimit(format!(
                    "memory of {} pages exceeds limit of {}",
                    limits.min, config.max_memory_pages
                )))
            }
            Some(limits) => Some(Memory::new(limits)),
            None => None,
        };
        let table = match module.table {
            Some(limits) if limits.min > config.max_table_size => {
                return Err(InstantiationError::ResourceLimit(format!(
                    "table of {} slots exceeds limit of {}",
                    limits.min, config.max_table_size
                )))
            }
            Some(limits) => Some(Table::new(limits)),
            None => None,
        };

        let mut store = Store {
            funcs,
            globals: GlobalStore::new(),
            memory,
            table,
        };
        let mut stack = CallStack::new(config.max_call_depth);

        tracing::trace!("initializing globals");
        for (ty, value) in imported_globals {
            store
                .globals
                .push(ty, value)
                .map_err(|trap| InstantiationError::InvalidModule(trap.to_string()))?;
        }
        for (i, def) in module.globals.iter().enumerate() {
            let value = Interpreter::new(module, &mut store, &mut stack, config.max_memory_pages)
                .eval_const(&def.init)
                .map_err(|trap| {
                    InstantiationError::InvalidModule(format!("initializer of global {i}: {trap}"))
                })?;
            store.globals.push(def.ty, value).map_err(|trap| {
                InstantiationError::InvalidModule(format!("initializer of global {i}: {trap}"))
            })?;
        }

        tracing::trace!(segments = module.data_segments.len(), "applying data segments");
        for seg in &module.data_segments {
            let offset = const_offset(module, &mut store, &mut stack, &seg.offset)?;
            let memory = store
                .memory
                .as_mut()
                .ok_or_else(|| InstantiationError::InvalidModule("data segment without memory".into()))?;
            let size = memory.size();
            memory
                .write_bytes(offset as usize, &seg.bytes)
                .map_err(|_| InstantiationError::MemoryInit {
                    offset: offset as u64,
                    len: seg.bytes.len(),
                    size,
                })?;
        }

        tracing::trace!(segments = module.elem_segments.len(), "applying element segments");
        for seg in &module.elem_segments {
            let offset = const_offset(module, &mut store, &mut stack, &seg.offset)?;
            let table = store
                .table
                .as_mut()
                .ok_or_else(|| InstantiationError::InvalidModule("element segment without table".into()))?;
            let size = table.size() as usize;
            table
                .init(offset as usize, &seg.funcs)
                .map_err(|_| InstantiationError::TableInit {
                    offset: offset as u64,
                    len: seg.funcs.len(),
                    size,
                })?;
        }

        if let Some(start) = module.start {
            tracing::debug!(func = start, "running start function");
            Interpreter::new(module, &mut store, &mut stack, config.max_memory_pages)
                .call(start, &[])
                .map_err(InstantiationError::Start)?;
        }

        let exports = module
            .exports
            .iter()
            .map(|e| (e.name.clone(), (e.kind, e.index)))
            .collect();

        tracing::debug!("instantiated");
        Ok(Instance {
            module,
            store,
            stack,
            config,
            exports,
        })
    }

    /// Call an exported function by name.
    pub fn call(&mut self, name: &str, args: &[Val]) -> Result<Option<Val>> {
        let idx = self.export_index(name, ExternKind::Func)?;
        self.call_index(idx, args)
    }

    /// Call any function of the instance by its index.
    pub fn call_index(&mut self, idx: u32, args: &[Val]) -> Result<Option<Val>> {
        Interpreter::new(
            self.module,
            &mut self.store,
            &mut self.stack,
            self.config.max_memory_pages,
        )
        .call(idx, args)
    }

    /// Read an exported global. Exports are read-only from the host side,
    /// even when the global is mutable inside the instance.
    pub fn global(&self, name: &str) -> Result<Val> {
        let idx = self.export_index(name, ExternKind::Global)?;
        self.store.globals.get(idx)
    }

    /// Function index behind an exported function name.
    pub fn func_index(&self, name: &str) -> Option<u32> {
        self.export_index(name, ExternKind::Func).ok()
    }

    pub fn exported_memory(&self, name: &str) -> Result<&Memory> {
        self.export_index(name, ExternKind::Memory)?;
        self.store.memory.as_ref().ok_or(Trap::MissingMemory)
    }

    pub fn exported_table(&self, name: &str) -> Result<&Table> {
        self.export_index(name, ExternKind::Table)?;
        self.store.table.as_ref().ok_or(Trap::MissingTable)
    }

    /// Exported names and their kinds, in no particular order.
    pub fn exports(&self) -> impl Iterator<Item = (&str, ExternKind)> + '_ {
        self.exports.iter().map(|(name, (kind, _))| (name.as_str(), *kind))
    }

    /// The instance's memory, exported or not. For host-side inspection.
    pub fn memory(&self) -> Option<&Memory> {
        self.store.memory.as_ref()
    }

    /// The instance's table, exported or not. For host-side inspection.
    pub fn table(&self) -> Option<&Table> {
        self.store.table.as_ref()
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    fn export_index(&self, name: &str, kind: ExternKind) -> Result<u32> {
        match self.exports.get(name) {
            Some(&(k, idx)) if k == kind => Ok(idx),
            _ => Err(Trap::UndefinedExport(name.into())),
        }
    }
}

/// Evaluate a segment offset. Offsets are unsigned 32-bit values.
fn const_offset(
    module: &Module,
    store: &mut Store,
    stack: &mut CallStack,
    expr: &crate::ir::Expr,
) -> std::result::Result<u32, InstantiationError> {
    let value = Interpreter::new(module, store, stack, 0)
        .eval_const(expr)
        .map_err(|trap| InstantiationError::InvalidModule(format!("segment offset: {trap}")))?;
    value
        .as_i32()
        .map(|v| v as u32)
        .ok_or_else(|| InstantiationError::InvalidModule("segment offset is not i32".into()))
}

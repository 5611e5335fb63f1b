//! Host-provided values that satisfy a module's imports.

use crate::{
    trap::Result,
    types::{FuncType, Val},
};
use std::{collections::HashMap, fmt, sync::Arc};

/// Callback type for host functions.
pub type HostCallback = dyn Fn(&[Val]) -> Result<Option<Val>> + Send + Sync;

/// A host function: signature plus callback.
#[derive(Clone)]
pub struct HostFunc {
    pub ty: FuncType,
    pub func: Arc<HostCallback>,
}

impl fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunc").field("ty", &self.ty).finish_non_exhaustive()
    }
}

/// A single host-provided item.
#[derive(Debug, Clone)]
pub enum Extern {
    Global(Val),
    Func(HostFunc),
}

impl Extern {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Extern::Global(_) => "global",
            Extern::Func(_) => "function",
        }
    }
}

/// Host environment keyed by `(module, field)`.
#[derive(Debug, Clone, Default)]
pub struct Imports {
    entries: HashMap<(String, String), Extern>,
}

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a global value. Replaces any earlier entry for the same name.
    pub fn global(mut self, module: impl Into<String>, field: impl Into<String>, value: Val) -> Self {
        self.define(module, field, Extern::Global(value));
        self
    }

    /// Provide a host function.
    pub fn func<F>(
        mut self,
        module: impl Into<String>,
        field: impl Into<String>,
        ty: FuncType,
        func: F,
    ) -> Self
    where
        F: Fn(&[Val]) -> Result<Option<Val>> + Send + Sync + 'static,
    {
        self.define(
            module,
            field,
            Extern::Func(HostFunc {
                ty,
                func: Arc::new(func),
            }),
        );
        self
    }

    pub fn define(&mut self, module: impl Into<String>, field: impl Into<String>, item: Extern) {
        self.entries.insert((module.into(), field.into()), item);
    }

    pub fn get(&self, module: &str, field: &str) -> Option<&Extern> {
        self.entries.get(&(module.to_owned(), field.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValType;

    #[test]
    fn lookup_by_module_and_field() {
        let imports = Imports::new()
            .global("test", "zero", Val::I32(0))
            .func("env", "id", FuncType::new(&[ValType::I32], &[ValType::I32]), |args| {
                Ok(args.first().copied())
            });
        assert!(matches!(imports.get("test", "zero"), Some(Extern::Global(Val::I32(0)))));
        assert!(matches!(imports.get("env", "id"), Some(Extern::Func(_))));
        assert!(imports.get("zero", "test").is_none());
        assert_eq!(imports.len(), 2);
    }

    #[test]
    fn later_definition_wins() {
        let imports = Imports::new()
            .global("test", "zero", Val::I32(0))
            .global("test", "zero", Val::I32(5));
        assert!(matches!(imports.get("test", "zero"), Some(Extern::Global(Val::I32(5)))));
    }
}

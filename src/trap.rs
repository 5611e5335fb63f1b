use thiserror::Error;

/// All ways execution can fail.
///
/// A trap aborts the current call chain and is handed back to the caller of
/// the top-level invocation. Instance state stays valid afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Trap {
    #[error("call stack exhausted")]
    StackOverflow,
    #[error("write to immutable global {0}")]
    ImmutableGlobalWrite(u32),
    #[error("out of bounds memory access at {offset} (len {len})")]
    MemoryAccess { offset: u64, len: usize },
    #[error("out of bounds table access at {0}")]
    TableAccess(u32),
    #[error("uninitialized table element {0}")]
    UninitializedElement(u32),
    #[error("indirect call signature mismatch")]
    IndirectCallSignature,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("unreachable executed")]
    Unreachable,
    #[error("out of memory")]
    OutOfMemory,
    #[error("no memory declared")]
    MissingMemory,
    #[error("no table declared")]
    MissingTable,
    #[error("undefined function {0}")]
    UndefinedFunction(u32),
    #[error("undefined global {0}")]
    UndefinedGlobal(u32),
    #[error("undefined local {0}")]
    UndefinedLocal(u32),
    #[error("undefined export: {0}")]
    UndefinedExport(String),
    #[error("host error: {0}")]
    HostError(String),
}

pub type Result<T> = std::result::Result<T, Trap>;

/// Failures while turning a [`Module`](crate::Module) into an
/// [`Instance`](crate::Instance). No instance is produced when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationError {
    #[error("invalid module: {0}")]
    InvalidModule(String),

    #[error("cannot resolve import {module}.{field}: {reason}")]
    ImportResolution {
        module: String,
        field: String,
        reason: String,
    },

    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("data segment out of bounds: offset {offset} + len {len} > memory size {size}")]
    MemoryInit { offset: u64, len: usize, size: usize },

    #[error("element segment out of bounds: offset {offset} + len {len} > table size {size}")]
    TableInit { offset: u64, len: usize, size: usize },

    #[error("trap while running start function")]
    Start(#[source] Trap),
}

impl InstantiationError {
    pub(crate) fn unresolved(module: &str, field: &str, reason: impl Into<String>) -> Self {
        InstantiationError::ImportResolution {
            module: module.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

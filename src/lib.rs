//! Tarn: a minimal tree-walking module interpreter.
//!
//! Modules are built in memory, instantiated against host imports, and
//! executed by structural recursion over expression trees. Supported: one
//! linear memory with data segments, one funcref table with element
//! segments, imported and defined globals, a start function, direct and
//! indirect calls, and integer/float arithmetic.
//!
//! # Quick start
//!
//! ```rust
//! use tarn::{
//!     ir::{BinOp, Expr, Function},
//!     module::ExternKind,
//!     types::{FuncType, GlobalType, Val, ValType},
//!     Imports, Module, Runtime,
//! };
//!
//! let mut module = Module::new();
//! let zero = module.import_global("test", "zero", GlobalType::immutable(ValType::I32));
//! let add = module.add_function(Function::new(
//!     "add",
//!     FuncType::new(&[ValType::I32, ValType::I32], &[ValType::I32]),
//!     vec![],
//!     Expr::binary(BinOp::I32Add, Expr::local(0), Expr::local(1)),
//! ));
//! module.export("add", ExternKind::Func, add);
//! module.export("zero", ExternKind::Global, zero);
//!
//! let imports = Imports::new().global("test", "zero", Val::I32(0));
//! let mut inst = Runtime::new().instantiate(&module, &imports).unwrap();
//! assert_eq!(inst.call("add", &[Val::I32(3), Val::I32(4)]).unwrap(), Some(Val::I32(7)));
//! assert_eq!(inst.global("zero").unwrap(), Val::I32(0));
//! ```

pub mod global;
pub mod imports;
pub mod instance;
mod interpreter;
pub mod ir;
pub mod memory;
pub mod module;
pub mod runtime;
pub mod stack;
pub mod table;
pub mod trap;
pub mod types;

pub use imports::Imports;
pub use instance::Instance;
pub use module::Module;
pub use runtime::{Config, Runtime};
pub use trap::{InstantiationError, Result, Trap};
pub use types::{FuncType, Val, ValType};

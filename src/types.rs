use std::fmt;

/// Primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValType {
    I32 = 0x7F,
    I64 = 0x7E,
    F32 = 0x7D,
    F64 = 0x7C,
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValType::I32 => f.write_str("i32"),
            ValType::I64 => f.write_str("i64"),
            ValType::F32 => f.write_str("f32"),
            ValType::F64 => f.write_str("f64"),
        }
    }
}

/// Function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<ValType>,
    /// At most one result.
    pub results: Vec<ValType>,
}

impl FuncType {
    pub fn new(params: &[ValType], results: &[ValType]) -> Self {
        FuncType {
            params: params.to_vec(),
            results: results.to_vec(),
        }
    }

    pub fn result(&self) -> Option<ValType> {
        self.results.first().copied()
    }

    /// Check that `args` has the arity and types of the parameter list.
    pub fn accepts(&self, args: &[Val]) -> bool {
        args.len() == self.params.len()
            && args.iter().zip(&self.params).all(|(v, ty)| v.ty() == *ty)
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |tys: &[ValType]| {
            tys.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(f, "[{}] -> [{}]", join(&self.params), join(&self.results))
    }
}

/// Type and mutability of a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub ty: ValType,
    pub mutable: bool,
}

impl GlobalType {
    pub fn immutable(ty: ValType) -> Self {
        GlobalType { ty, mutable: false }
    }

    pub fn mutable(ty: ValType) -> Self {
        GlobalType { ty, mutable: true }
    }
}

/// Size limits of a memory (in pages) or a table (in slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Limits { min, max }
    }

    pub fn at_least(min: u32) -> Self {
        Limits { min, max: None }
    }

    /// `min` does not exceed `max`.
    pub fn is_valid(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

/// A runtime value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Val {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Val {
    pub fn ty(&self) -> ValType {
        match self {
            Val::I32(_) => ValType::I32,
            Val::I64(_) => ValType::I64,
            Val::F32(_) => ValType::F32,
            Val::F64(_) => ValType::F64,
        }
    }

    pub fn as_i32(self) -> Option<i32> {
        if let Val::I32(v) = self {
            Some(v)
        } else {
            None
        }
    }
    pub fn as_i64(self) -> Option<i64> {
        if let Val::I64(v) = self {
            Some(v)
        } else {
            None
        }
    }
    pub fn as_f32(self) -> Option<f32> {
        if let Val::F32(v) = self {
            Some(v)
        } else {
            None
        }
    }
    pub fn as_f64(self) -> Option<f64> {
        if let Val::F64(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn default_for(ty: ValType) -> Val {
        match ty {
            ValType::I32 => Val::I32(0),
            ValType::I64 => Val::I64(0),
            ValType::F32 => Val::F32(0.0),
            ValType::F64 => Val::F64(0.0),
        }
    }

    /// Booleans are encoded as i32 0/1.
    pub fn from_bool(b: bool) -> Val {
        Val::I32(b as i32)
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::I32(v) => write!(f, "{v}:i32"),
            Val::I64(v) => write!(f, "{v}:i64"),
            Val::F32(v) => write!(f, "{v}:f32"),
            Val::F64(v) => write!(f, "{v}:f64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zero() {
        assert_eq!(Val::default_for(ValType::I32), Val::I32(0));
        assert_eq!(Val::default_for(ValType::F64), Val::F64(0.0));
    }

    #[test]
    fn func_type_accepts_matching_args() {
        let ty = FuncType::new(&[ValType::I32, ValType::I64], &[ValType::I32]);
        assert!(ty.accepts(&[Val::I32(1), Val::I64(2)]));
        assert!(!ty.accepts(&[Val::I32(1)]));
        assert!(!ty.accepts(&[Val::I64(1), Val::I64(2)]));
    }

    #[test]
    fn limits_validity() {
        assert!(Limits::at_least(3).is_valid());
        assert!(Limits::new(1, Some(1)).is_valid());
        assert!(!Limits::new(2, Some(1)).is_valid());
    }

    #[test]
    fn display_signature() {
        let ty = FuncType::new(&[ValType::I32], &[ValType::I32]);
        assert_eq!(ty.to_string(), "[i32] -> [i32]");
        assert_eq!(Val::I32(-1).to_string(), "-1:i32");
    }
}

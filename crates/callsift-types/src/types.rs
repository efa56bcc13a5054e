//! Resolved type representations

use std::collections::HashMap;

use callsift_ast::ChanDir;
use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// Index into the [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The invalid type, used for error recovery
    pub const INVALID: TypeId = TypeId(0);

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Error recovery
    Invalid,

    /// Predeclared basic type, typed or untyped
    Basic(BasicKind),

    /// Defined type: `type T struct{...}`. `underlying` is never itself named.
    Named {
        obj: ObjectId,
        underlying: TypeId,
        methods: Vec<ObjectId>,
    },

    Pointer(TypeId),
    Slice(TypeId),
    /// `len` is known only for literal lengths
    Array { len: Option<u64>, elem: TypeId },
    Map { key: TypeId, value: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Signature(Signature),
    /// Field objects, embedded fields included
    Struct { fields: Vec<ObjectId> },
    /// Explicit methods and embedded interfaces
    Interface {
        methods: Vec<ObjectId>,
        embedded: Vec<TypeId>,
    },
    /// Result list of a multi-value call
    Tuple(Vec<TypeId>),
}

/// A function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// The last parameter is `...T`, stored as `[]T`
    pub variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

/// Coarse classification of basic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicCategory {
    Boolean,
    Integer,
    Float,
    Complex,
    String,
    Nil,
}

impl BasicKind {
    pub const ALL: [BasicKind; 24] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedComplex,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    /// The type an untyped constant takes when nothing else decides
    pub fn default_kind(&self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => *other,
        }
    }

    pub fn category(&self) -> BasicCategory {
        match self {
            BasicKind::Bool | BasicKind::UntypedBool => BasicCategory::Boolean,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat => {
                BasicCategory::Float
            }
            BasicKind::Complex64 | BasicKind::Complex128 | BasicKind::UntypedComplex => {
                BasicCategory::Complex
            }
            BasicKind::String | BasicKind::UntypedString => BasicCategory::String,
            BasicKind::UntypedNil => BasicCategory::Nil,
            _ => BasicCategory::Integer,
        }
    }

    /// Ordering used to combine two untyped operands: int < rune < float < complex
    pub(crate) fn untyped_rank(&self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            BasicKind::UntypedComplex => 4,
            _ => 0,
        }
    }
}

/// Owns every type of an analysis pass. Composite unnamed types are interned
/// so the same `[]int` is always the same id.
#[derive(Debug, Clone)]
pub struct TypeArena {
    types: Vec<Type>,
    interned: HashMap<Type, TypeId>,
    basics: Vec<TypeId>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            types: vec![Type::Invalid],
            interned: HashMap::new(),
            basics: Vec::new(),
        };
        for kind in BasicKind::ALL {
            let id = arena.intern(Type::Basic(kind));
            arena.basics.push(id);
        }
        arena
    }

    /// Add a type that has identity of its own (named, struct, interface)
    pub fn insert(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Add or reuse a structurally identified type
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        self.types.get(id.0 as usize).unwrap_or(&Type::Invalid)
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> Option<&mut Type> {
        self.types.get_mut(id.0 as usize)
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics
            .get(kind as usize)
            .copied()
            .unwrap_or(TypeId::INVALID)
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice(elem))
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(elems))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_types_are_preallocated() {
        let arena = TypeArena::new();
        let int = arena.basic(BasicKind::Int);
        assert_eq!(arena.get(int), &Type::Basic(BasicKind::Int));
        assert!(!int.is_invalid());
    }

    #[test]
    fn test_interning() {
        let mut arena = TypeArena::new();
        let int = arena.basic(BasicKind::Int);
        let a = arena.slice(int);
        let b = arena.slice(int);
        assert_eq!(a, b);
        let p = arena.pointer(int);
        assert_ne!(a, p);
    }

    #[test]
    fn test_untyped_defaults() {
        assert_eq!(BasicKind::UntypedInt.default_kind(), BasicKind::Int);
        assert_eq!(BasicKind::UntypedRune.default_kind(), BasicKind::Int32);
        assert_eq!(BasicKind::UntypedFloat.default_kind(), BasicKind::Float64);
        assert_eq!(BasicKind::UntypedRune.category(), BasicCategory::Integer);
        assert!(!BasicKind::Uint8.is_untyped());
    }
}

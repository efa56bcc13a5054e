//! Named language entities: packages, functions, methods, fields, variables

use callsift_ast::{FileId, Span};
use serde::{Deserialize, Serialize};

use crate::TypeId;

/// Index into the object arena of a [`TypeInfo`](crate::TypeInfo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Index into the package table of a [`TypeInfo`](crate::TypeInfo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(pub u32);

/// Where an object was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub file: FileId,
    pub span: Span,
}

/// A declared entity
#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    /// Declaring package; `None` for the universe
    pub package: Option<PackageId>,
    pub ty: TypeId,
    pub site: Option<Site>,
}

impl Object {
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// An imported package name, local to one file
    Package { imported: PackageId },
    Function,
    /// A concrete method (`recv` is the named receiver type) or an interface
    /// method (`recv` is the interface type)
    Method {
        recv: TypeId,
        pointer: bool,
        interface: bool,
    },
    BuiltIn(Builtin),
    Field { embedded: bool },
    Variable { param: bool },
    TypeName,
    Constant,
    Nil,
}

/// The object kinds the Type Oracle reports for an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Package,
    Function,
    BuiltIn,
    Field,
    Method,
    Variable,
    TypeName,
    Constant,
    Unresolved,
}

impl ObjectKind {
    pub fn class(&self) -> ObjectClass {
        match self {
            ObjectKind::Package { .. } => ObjectClass::Package,
            ObjectKind::Function => ObjectClass::Function,
            ObjectKind::Method { .. } => ObjectClass::Method,
            ObjectKind::BuiltIn(_) => ObjectClass::BuiltIn,
            ObjectKind::Field { .. } => ObjectClass::Field,
            ObjectKind::Variable { .. } => ObjectClass::Variable,
            ObjectKind::TypeName => ObjectClass::TypeName,
            ObjectKind::Constant | ObjectKind::Nil => ObjectClass::Constant,
        }
    }
}

/// Universe functions with no user declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Clear,
        Builtin::Close,
        Builtin::Complex,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Imag,
        Builtin::Len,
        Builtin::Make,
        Builtin::Max,
        Builtin::Min,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Real,
        Builtin::Recover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Clear => "clear",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
        }
    }
}

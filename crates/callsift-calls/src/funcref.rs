//! Canonical identity of functions and methods

use std::fmt;

use callsift_ast::{FuncDecl, SyntaxUnit};
use callsift_types::{ObjectId, ObjectKind, TypeInfo};
use serde::{Deserialize, Serialize};

/// A function or method, independent of how a call reached it.
///
/// A method reached through promotion, through a pointer, or through a
/// value receiver always maps to the same `FuncRef` as its declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncRef {
    /// Import path of the declaring package
    pub package: String,
    pub receiver: Option<ReceiverRef>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReceiverRef {
    pub type_name: String,
    pub pointer: bool,
}

impl FuncRef {
    pub fn function(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            receiver: None,
            name: name.into(),
        }
    }

    pub fn method(
        package: impl Into<String>,
        type_name: impl Into<String>,
        pointer: bool,
        name: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            receiver: Some(ReceiverRef {
                type_name: type_name.into(),
                pointer,
            }),
            name: name.into(),
        }
    }

    /// The declaration behind a function or concrete method object.
    /// Interface methods and everything else have none.
    pub fn from_object(info: &TypeInfo, obj: ObjectId) -> Option<Self> {
        let object = info.object(obj);
        let package = info.package_path_of(obj)?.to_string();
        match object.kind {
            ObjectKind::Function => Some(Self::function(package, &object.name)),
            ObjectKind::Method {
                interface: false, ..
            } => {
                let (type_name, pointer) = info.method_receiver(obj)?;
                Some(Self::method(
                    package,
                    &info.object(type_name).name,
                    pointer,
                    &object.name,
                ))
            }
            _ => None,
        }
    }

    /// Identity of a declaration in the package at `package`
    pub fn from_decl(package: &str, decl: &FuncDecl) -> Self {
        match decl.recv.as_ref().and_then(|recv| recv.base_type()) {
            Some((type_name, pointer)) => {
                Self::method(package, &type_name.name, pointer, &decl.name.name)
            }
            None => Self::function(package, &decl.name.name),
        }
    }

    /// Identity of a declaration of `unit` as the oracle resolved it.
    /// Falls back to the package name when the declaration has no object.
    pub fn declared(info: &TypeInfo, unit: &SyntaxUnit, decl: &FuncDecl) -> Self {
        if let Some(found) = info
            .defs
            .get(&decl.name.id)
            .and_then(|obj| Self::from_object(info, *obj))
        {
            return found;
        }
        let package = info
            .packages()
            .find(|(_, p)| p.analyzed && p.name == unit.package_name())
            .map(|(_, p)| p.path.as_str())
            .unwrap_or(unit.package_name());
        Self::from_decl(package, decl)
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

impl fmt::Display for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.receiver {
            Some(ReceiverRef {
                type_name,
                pointer: true,
            }) => write!(f, "(*{}.{}).{}", self.package, type_name, self.name),
            Some(ReceiverRef {
                type_name,
                pointer: false,
            }) => write!(f, "({}.{}).{}", self.package, type_name, self.name),
            None => write!(f, "{}.{}", self.package, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FuncRef::function("main", "run").to_string(), "main.run");
        assert_eq!(
            FuncRef::method("shapes", "Circle", false, "Area").to_string(),
            "(shapes.Circle).Area"
        );
        assert_eq!(
            FuncRef::method("main", "Inner", true, "Bump").to_string(),
            "(*main.Inner).Bump"
        );
    }

    #[test]
    fn test_ordering_groups_by_package() {
        let mut refs = vec![
            FuncRef::function("b", "x"),
            FuncRef::method("a", "T", false, "m"),
            FuncRef::function("a", "z"),
        ];
        refs.sort();
        assert_eq!(refs[0].package, "a");
        assert_eq!(refs[2].package, "b");
    }
}

//! The Type Oracle: the read-only index produced by one resolution pass

use std::collections::{BTreeMap, HashMap, HashSet};

use callsift_ast::{Expr, Ident, NodeId};
use serde::{Deserialize, Serialize};

use crate::{
    universe, BasicKind, Object, ObjectClass, ObjectId, ObjectKind, PackageId, Type, TypeArena,
    TypeId,
};

/// A package known to the pass, analyzed or imported
#[derive(Debug, Clone)]
pub struct Package {
    pub path: String,
    pub name: String,
    /// Package-level declarations
    pub scope: BTreeMap<String, ObjectId>,
    /// Part of the analyzed set rather than pulled in through an importer
    pub analyzed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionKind {
    /// `x.f` selects a struct field
    FieldVal,
    /// `x.m` selects a method bound to the value `x`
    MethodVal,
    /// `T.m` or `(*T).m`, a method used as a function
    MethodExpr,
}

/// How a selector expression `x.f` was resolved.
///
/// `path` lists the embedded fields walked through to reach `object`, in
/// order. It is empty when `f` is declared directly on the type of `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Type of `x`
    pub recv: TypeId,
    pub object: ObjectId,
    pub path: Vec<ObjectId>,
    /// A pointer was dereferenced along the way
    pub indirect: bool,
}

impl Selection {
    pub fn is_promoted(&self) -> bool {
        !self.path.is_empty()
    }

    /// Number of embedding levels unwound
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// What an expression denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// A call with no results
    NoValue,
    Builtin,
    Type,
    Constant,
    Variable,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAndValue {
    pub mode: Mode,
    pub ty: TypeId,
}

/// Resolved-type index over a closed set of packages.
///
/// Built once by [`resolve`](crate::resolve) and read-only afterwards. Nodes
/// created later by a rewrite have ids this index has never seen; every
/// query simply returns nothing for them.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub types: TypeArena,
    pub(crate) objects: Vec<Object>,
    pub(crate) packages: Vec<Package>,
    pub(crate) universe: HashMap<String, ObjectId>,
    /// Identifier occurrences that refer to an object
    pub uses: HashMap<NodeId, ObjectId>,
    /// Identifiers that declare an object
    pub defs: HashMap<NodeId, ObjectId>,
    /// Every checked expression
    pub expr_types: HashMap<NodeId, TypeAndValue>,
    /// Field and method selectors; qualified identifiers go to `uses`
    pub selections: HashMap<NodeId, Selection>,
    /// Selectors whose member is reachable at one depth along two paths
    pub ambiguous: HashSet<NodeId>,
}

impl Default for TypeInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInfo {
    /// An empty index holding only the universe scope
    pub fn new() -> Self {
        let mut info = Self {
            types: TypeArena::new(),
            objects: Vec::new(),
            packages: Vec::new(),
            universe: HashMap::new(),
            uses: HashMap::new(),
            defs: HashMap::new(),
            expr_types: HashMap::new(),
            selections: HashMap::new(),
            ambiguous: HashSet::new(),
        };
        universe::populate(&mut info);
        info
    }

    pub(crate) fn add_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0 as usize)
    }

    pub(crate) fn add_package(&mut self, package: Package) -> PackageId {
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(package);
        id
    }

    pub(crate) fn package_mut(&mut self, id: PackageId) -> Option<&mut Package> {
        self.packages.get_mut(id.0 as usize)
    }

    // === Objects and packages ===

    /// Look up an object. Ids are only ever created by this index.
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectId(i as u32), o))
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i as u32), p))
    }

    pub fn package_by_path(&self, path: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.path == path)
            .map(|i| PackageId(i as u32))
    }

    /// A universe object such as `append` or `int`
    pub fn universe_lookup(&self, name: &str) -> Option<ObjectId> {
        self.universe.get(name).copied()
    }

    /// Import path of the package declaring `obj`, if any
    pub fn package_path_of(&self, obj: ObjectId) -> Option<&str> {
        self.object(obj)
            .package
            .map(|pkg| self.package(pkg).path.as_str())
    }

    // === Oracle queries ===

    /// The object an identifier declares or refers to
    pub fn object_of(&self, ident: &Ident) -> Option<ObjectId> {
        self.defs
            .get(&ident.id)
            .or_else(|| self.uses.get(&ident.id))
            .copied()
    }

    /// Kind of the object an identifier resolves to
    pub fn object_kind(&self, ident: &Ident) -> ObjectClass {
        self.object_of(ident)
            .map(|obj| self.object(obj).kind.class())
            .unwrap_or(ObjectClass::Unresolved)
    }

    pub fn selection(&self, expr: &Expr) -> Option<&Selection> {
        self.selections.get(&expr.id)
    }

    pub fn type_and_value(&self, expr: &Expr) -> Option<&TypeAndValue> {
        self.expr_types.get(&expr.id)
    }

    pub fn type_of(&self, expr: &Expr) -> Option<TypeId> {
        self.type_and_value(expr)
            .map(|tv| tv.ty)
            .filter(|ty| !ty.is_invalid())
    }

    pub fn is_ambiguous(&self, expr: &Expr) -> bool {
        self.ambiguous.contains(&expr.id)
    }

    // === Type helpers ===

    pub fn ty(&self, id: TypeId) -> &Type {
        self.types.get(id)
    }

    /// Strip names: the underlying type of a named type
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        match self.ty(ty) {
            Type::Named { underlying, .. } => *underlying,
            _ => ty,
        }
    }

    /// `*T` -> (`T`, true), anything else unchanged
    pub fn deref(&self, ty: TypeId) -> (TypeId, bool) {
        match self.ty(ty) {
            Type::Pointer(elem) => (*elem, true),
            _ => (ty, false),
        }
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        matches!(self.ty(self.underlying(ty)), Type::Interface { .. })
    }

    /// Type name object of a named type
    pub fn type_name(&self, ty: TypeId) -> Option<ObjectId> {
        match self.ty(ty) {
            Type::Named { obj, .. } => Some(*obj),
            _ => None,
        }
    }

    /// Basic kind of an unnamed basic type
    pub fn basic(&self, ty: TypeId) -> Option<BasicKind> {
        match self.ty(ty) {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Receiver type name and pointer flag of a concrete method
    pub fn method_receiver(&self, method: ObjectId) -> Option<(ObjectId, bool)> {
        match self.object(method).kind {
            ObjectKind::Method {
                recv,
                pointer,
                interface: false,
            } => self.type_name(recv).map(|name| (name, pointer)),
            _ => None,
        }
    }

    /// Human-readable type, qualified by package name: `*main.Outer`
    pub fn display_type(&self, ty: TypeId) -> String {
        let list = |ids: &[TypeId]| {
            ids.iter()
                .map(|t| self.display_type(*t))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.ty(ty) {
            Type::Invalid => "invalid type".to_string(),
            Type::Basic(kind) => kind.name().to_string(),
            Type::Named { obj, .. } => {
                let obj = self.object(*obj);
                match obj.package {
                    Some(pkg) => format!("{}.{}", self.package(pkg).name, obj.name),
                    None => obj.name.clone(),
                }
            }
            Type::Pointer(elem) => format!("*{}", self.display_type(*elem)),
            Type::Slice(elem) => format!("[]{}", self.display_type(*elem)),
            Type::Array { len, elem } => match len {
                Some(n) => format!("[{}]{}", n, self.display_type(*elem)),
                None => format!("[?]{}", self.display_type(*elem)),
            },
            Type::Map { key, value } => {
                format!("map[{}]{}", self.display_type(*key), self.display_type(*value))
            }
            Type::Chan { dir, elem } => {
                let prefix = match dir {
                    callsift_ast::ChanDir::Both => "chan ",
                    callsift_ast::ChanDir::Send => "chan<- ",
                    callsift_ast::ChanDir::Recv => "<-chan ",
                };
                format!("{}{}", prefix, self.display_type(*elem))
            }
            Type::Signature(sig) => {
                let results = match sig.results.len() {
                    0 => String::new(),
                    1 => format!(" {}", self.display_type(sig.results[0])),
                    _ => format!(" ({})", list(&sig.results)),
                };
                format!("func({}){}", list(&sig.params), results)
            }
            Type::Struct { fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let field = self.object(*f);
                        format!("{} {}", field.name, self.display_type(field.ty))
                    })
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            Type::Interface { methods, embedded } => {
                if methods.is_empty() && embedded.is_empty() {
                    "interface{}".to_string()
                } else {
                    let names: Vec<&str> = methods
                        .iter()
                        .map(|m| self.object(*m).name.as_str())
                        .collect();
                    format!("interface{{{}}}", names.join("; "))
                }
            }
            Type::Tuple(elems) => format!("({})", list(elems)),
        }
    }
}

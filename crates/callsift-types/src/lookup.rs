//! Field and method lookup through embedded fields
//!
//! Breadth-first over embedding depth: all members reachable at depth 0 are
//! considered before anything at depth 1, and so on. The first depth with a
//! match decides. Two matches at that depth, or one match inside a type that
//! is itself embedded twice at that depth, make the selector ambiguous.

use std::collections::HashSet;

use crate::{ObjectId, Type, TypeId, TypeInfo};

/// Outcome of [`lookup_field_or_method`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found {
        object: ObjectId,
        /// Embedded fields walked through, outermost first
        path: Vec<ObjectId>,
        /// A pointer was followed on the way
        indirect: bool,
    },
    Ambiguous,
    NotFound,
}

#[derive(Debug, Clone)]
struct Entry {
    ty: TypeId,
    path: Vec<ObjectId>,
    indirect: bool,
    /// The same type was reached along more than one path at this depth
    multiples: bool,
}

/// Find the field or method `name` of type `ty`.
///
/// `ty` may be a pointer to the type holding the member.
pub fn lookup_field_or_method(info: &TypeInfo, ty: TypeId, name: &str) -> Lookup {
    if name == "_" {
        return Lookup::NotFound;
    }
    let (start, indirect) = info.deref(ty);
    let mut current = vec![Entry {
        ty: start,
        path: Vec::new(),
        indirect,
        multiples: false,
    }];
    let mut seen: HashSet<TypeId> = HashSet::new();

    while !current.is_empty() {
        let mut next: Vec<Entry> = Vec::new();
        let mut found: Option<(ObjectId, &Entry)> = None;

        for entry in &current {
            let mut ty = entry.ty;

            if let Type::Named {
                methods, underlying, ..
            } = info.ty(ty)
            {
                if !seen.insert(ty) {
                    continue;
                }
                if let Some(method) = methods.iter().find(|m| info.object(**m).name == name) {
                    if found.is_some() {
                        return Lookup::Ambiguous;
                    }
                    found = Some((*method, entry));
                    continue;
                }
                ty = *underlying;
            }

            match info.ty(ty) {
                Type::Struct { fields } => {
                    for field in fields {
                        let obj = info.object(*field);
                        if obj.name == name {
                            if found.is_some() {
                                return Lookup::Ambiguous;
                            }
                            found = Some((*field, entry));
                            continue;
                        }
                        if found.is_none() && is_embedded(info, *field) {
                            let (inner, ptr) = info.deref(obj.ty);
                            let mut path = entry.path.clone();
                            path.push(*field);
                            next.push(Entry {
                                ty: inner,
                                path,
                                indirect: entry.indirect || ptr,
                                multiples: entry.multiples,
                            });
                        }
                    }
                }
                Type::Interface { .. } => {
                    if let Some(method) = interface_method(info, ty, name) {
                        if found.is_some() {
                            return Lookup::Ambiguous;
                        }
                        found = Some((method, entry));
                    }
                }
                _ => {}
            }
        }

        if let Some((object, entry)) = found {
            if entry.multiples {
                return Lookup::Ambiguous;
            }
            return Lookup::Found {
                object,
                path: entry.path.clone(),
                indirect: entry.indirect,
            };
        }

        current = consolidate_multiples(next);
    }

    Lookup::NotFound
}

fn is_embedded(info: &TypeInfo, field: ObjectId) -> bool {
    matches!(
        info.object(field).kind,
        crate::ObjectKind::Field { embedded: true }
    )
}

/// Merge entries that reach the same type, flagging them as multiples
fn consolidate_multiples(entries: Vec<Entry>) -> Vec<Entry> {
    let mut out: Vec<Entry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.iter_mut().find(|e| e.ty == entry.ty) {
            Some(existing) => existing.multiples = true,
            None => out.push(entry),
        }
    }
    out
}

/// Look up a method of an interface, including embedded interfaces
pub fn interface_method(info: &TypeInfo, iface: TypeId, name: &str) -> Option<ObjectId> {
    let mut visited = HashSet::new();
    find_in_interface(info, iface, name, &mut visited)
}

fn find_in_interface(
    info: &TypeInfo,
    iface: TypeId,
    name: &str,
    visited: &mut HashSet<TypeId>,
) -> Option<ObjectId> {
    let iface = info.underlying(iface);
    if !visited.insert(iface) {
        return None;
    }
    let Type::Interface { methods, embedded } = info.ty(iface) else {
        return None;
    };
    if let Some(m) = methods.iter().find(|m| info.object(**m).name == name) {
        return Some(*m);
    }
    embedded
        .iter()
        .find_map(|e| find_in_interface(info, *e, name, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Object, ObjectKind};

    struct Fixture {
        info: TypeInfo,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                info: TypeInfo::new(),
            }
        }

        fn named(&mut self, name: &str) -> TypeId {
            let obj = self.info.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::TypeName,
                package: None,
                ty: TypeId::INVALID,
                site: None,
            });
            let ty = self.info.types.insert(Type::Named {
                obj,
                underlying: TypeId::INVALID,
                methods: Vec::new(),
            });
            if let Some(o) = self.info.object_mut(obj) {
                o.ty = ty;
            }
            ty
        }

        fn field(&mut self, name: &str, ty: TypeId, embedded: bool) -> ObjectId {
            self.info.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::Field { embedded },
                package: None,
                ty,
                site: None,
            })
        }

        fn set_struct(&mut self, named: TypeId, fields: Vec<ObjectId>) {
            let st = self.info.types.insert(Type::Struct { fields });
            if let Some(Type::Named { underlying, .. }) = self.info.types.get_mut(named) {
                *underlying = st;
            }
        }

        fn method(&mut self, named: TypeId, name: &str) -> ObjectId {
            let m = self.info.add_object(Object {
                name: name.to_string(),
                kind: ObjectKind::Method {
                    recv: named,
                    pointer: false,
                    interface: false,
                },
                package: None,
                ty: TypeId::INVALID,
                site: None,
            });
            if let Some(Type::Named { methods, .. }) = self.info.types.get_mut(named) {
                methods.push(m);
            }
            m
        }
    }

    #[test]
    fn test_direct_and_promoted() {
        let mut fx = Fixture::new();
        let inner = fx.named("Inner");
        let outer = fx.named("Outer");
        let int = fx.info.types.basic(crate::BasicKind::Int);
        let x = fx.field("x", int, false);
        fx.set_struct(inner, vec![x]);
        let m = fx.method(inner, "M");
        let ptr = fx.info.types.pointer(inner);
        let emb = fx.field("Inner", ptr, true);
        fx.set_struct(outer, vec![emb]);

        assert_eq!(
            lookup_field_or_method(&fx.info, outer, "M"),
            Lookup::Found {
                object: m,
                path: vec![emb],
                indirect: true,
            }
        );
        assert_eq!(
            lookup_field_or_method(&fx.info, inner, "x"),
            Lookup::Found {
                object: x,
                path: vec![],
                indirect: false,
            }
        );
        assert_eq!(lookup_field_or_method(&fx.info, outer, "y"), Lookup::NotFound);
    }

    #[test]
    fn test_shallowest_wins() {
        let mut fx = Fixture::new();
        let a = fx.named("A");
        let b = fx.named("B");
        let int = fx.info.types.basic(crate::BasicKind::Int);
        let deep = fx.field("N", int, false);
        fx.set_struct(b, vec![deep]);
        let emb = fx.field("B", b, true);
        let shallow = fx.field("N", int, false);
        fx.set_struct(a, vec![emb, shallow]);

        let Lookup::Found { object, path, .. } = lookup_field_or_method(&fx.info, a, "N") else {
            panic!("expected a match");
        };
        assert_eq!(object, shallow);
        assert!(path.is_empty());
    }

    #[test]
    fn test_same_depth_is_ambiguous() {
        let mut fx = Fixture::new();
        let a = fx.named("A");
        let b = fx.named("B");
        let c = fx.named("C");
        fx.set_struct(a, vec![]);
        fx.set_struct(b, vec![]);
        fx.method(a, "M");
        fx.method(b, "M");
        let ea = fx.field("A", a, true);
        let eb = fx.field("B", b, true);
        fx.set_struct(c, vec![ea, eb]);
        assert_eq!(lookup_field_or_method(&fx.info, c, "M"), Lookup::Ambiguous);
    }
}

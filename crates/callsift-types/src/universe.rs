//! The universe scope: predeclared types, constants and built-in functions

use crate::{
    BasicKind, Builtin, Object, ObjectKind, Signature, Type, TypeId, TypeInfo,
};

/// Predeclared type names and the basic kind they denote
const BASIC_NAMES: &[(&str, BasicKind)] = &[
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("complex64", BasicKind::Complex64),
    ("complex128", BasicKind::Complex128),
    ("string", BasicKind::String),
    // aliases
    ("byte", BasicKind::Uint8),
    ("rune", BasicKind::Int32),
];

pub(crate) fn populate(info: &mut TypeInfo) {
    for (name, kind) in BASIC_NAMES {
        let ty = info.types.basic(*kind);
        declare(info, name, ObjectKind::TypeName, ty);
    }

    let empty = info.types.insert(Type::Interface {
        methods: Vec::new(),
        embedded: Vec::new(),
    });
    declare(info, "any", ObjectKind::TypeName, empty);
    declare(info, "comparable", ObjectKind::TypeName, empty);

    // type error interface { Error() string }
    let error_obj = declare(info, "error", ObjectKind::TypeName, TypeId::INVALID);
    let iface = info.types.insert(Type::Interface {
        methods: Vec::new(),
        embedded: Vec::new(),
    });
    let string = info.types.basic(BasicKind::String);
    let sig = info.types.insert(Type::Signature(Signature {
        params: Vec::new(),
        results: vec![string],
        variadic: false,
    }));
    let method = info.add_object(Object {
        name: "Error".to_string(),
        kind: ObjectKind::Method {
            recv: iface,
            pointer: false,
            interface: true,
        },
        package: None,
        ty: sig,
        site: None,
    });
    if let Some(Type::Interface { methods, .. }) = info.types.get_mut(iface) {
        methods.push(method);
    }
    let error = info.types.insert(Type::Named {
        obj: error_obj,
        underlying: iface,
        methods: Vec::new(),
    });
    if let Some(obj) = info.object_mut(error_obj) {
        obj.ty = error;
    }

    let untyped_bool = info.types.basic(BasicKind::UntypedBool);
    declare(info, "true", ObjectKind::Constant, untyped_bool);
    declare(info, "false", ObjectKind::Constant, untyped_bool);
    let untyped_int = info.types.basic(BasicKind::UntypedInt);
    declare(info, "iota", ObjectKind::Constant, untyped_int);
    let untyped_nil = info.types.basic(BasicKind::UntypedNil);
    declare(info, "nil", ObjectKind::Nil, untyped_nil);

    for builtin in Builtin::ALL {
        declare(info, builtin.name(), ObjectKind::BuiltIn(builtin), TypeId::INVALID);
    }
}

fn declare(info: &mut TypeInfo, name: &str, kind: ObjectKind, ty: TypeId) -> crate::ObjectId {
    let id = info.add_object(Object {
        name: name.to_string(),
        kind,
        package: None,
        ty,
        site: None,
    });
    info.universe.insert(name.to_string(), id);
    id
}

#[cfg(test)]
mod tests {
    use crate::{ObjectClass, TypeInfo};

    #[test]
    fn test_universe_contents() {
        let info = TypeInfo::new();
        let append = info.universe_lookup("append").unwrap();
        assert_eq!(info.object(append).kind.class(), ObjectClass::BuiltIn);
        let error = info.universe_lookup("error").unwrap();
        let ty = info.object(error).ty;
        assert!(info.is_interface(ty));
        assert_eq!(info.display_type(ty), "error");
        let byte = info.universe_lookup("byte").unwrap();
        assert_eq!(info.display_type(info.object(byte).ty), "uint8");
    }
}

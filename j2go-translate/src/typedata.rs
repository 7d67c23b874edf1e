//! The type model: classify Java types into their Go representations.

use std::sync::Arc;

use j2go_goast::ast::Expr as GoExpr;
use once_cell::sync::Lazy;

use crate::{Result, TranslateError};

/// The fixed primitive set. `String` maps here too: Go strings are values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Bool,
    Byte,
    Char,
    Int16,
    Int,
    Int64,
    Float32,
    Float64,
    Str,
    GenericObject,
}

impl Primitive {
    pub fn go_name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Int16 => "int16",
            Primitive::Int => "int",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Str => "string",
            Primitive::GenericObject => "interface{}",
        }
    }
}

/// Classification of one Java type into its Go shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeData {
    Primitive(Primitive),
    Array {
        elem: Option<Arc<TypeData>>,
        dims: usize,
    },
    Map {
        key: Option<Arc<TypeData>>,
        value: Option<Arc<TypeData>>,
    },
    Class(String),
    Interface(String),
}

/// Resolves imported type names and the interface list from the
/// configuration; implemented by the program model.
pub trait TypeDict {
    fn imported_type(&self, name: &str) -> Option<String>;
    fn is_interface(&self, name: &str) -> bool;
}

macro_rules! interned {
    ($name:ident, $prim:ident) => {
        static $name: Lazy<Arc<TypeData>> =
            Lazy::new(|| Arc::new(TypeData::Primitive(Primitive::$prim)));
    };
}

interned!(VOID, Void);
interned!(BOOL, Bool);
interned!(BYTE, Byte);
interned!(CHAR, Char);
interned!(INT16, Int16);
interned!(INT, Int);
interned!(INT64, Int64);
interned!(FLOAT32, Float32);
interned!(FLOAT64, Float64);
interned!(STRING, Str);
interned!(GENERIC_OBJECT, GenericObject);

/// The interned singleton for a primitive kind. Repeated calls return
/// pointer-equal `Arc`s.
pub fn interned(p: Primitive) -> Arc<TypeData> {
    match p {
        Primitive::Void => VOID.clone(),
        Primitive::Bool => BOOL.clone(),
        Primitive::Byte => BYTE.clone(),
        Primitive::Char => CHAR.clone(),
        Primitive::Int16 => INT16.clone(),
        Primitive::Int => INT.clone(),
        Primitive::Int64 => INT64.clone(),
        Primitive::Float32 => FLOAT32.clone(),
        Primitive::Float64 => FLOAT64.clone(),
        Primitive::Str => STRING.clone(),
        Primitive::GenericObject => GENERIC_OBJECT.clone(),
    }
}

pub fn int_type() -> Arc<TypeData> {
    interned(Primitive::Int)
}

pub fn bool_type() -> Arc<TypeData> {
    interned(Primitive::Bool)
}

pub fn string_type() -> Arc<TypeData> {
    interned(Primitive::Str)
}

pub fn generic_object() -> Arc<TypeData> {
    interned(Primitive::GenericObject)
}

/// Map a Java primitive keyword (or `String`) plus a dimension count to a
/// TypeData, array-wrapping when `dims > 0`.
pub fn classify_primitive(typename: &str, dims: usize) -> Result<Arc<TypeData>> {
    let base = match typename.to_lowercase().as_str() {
        "void" => interned(Primitive::Void),
        "boolean" => interned(Primitive::Bool),
        "byte" => interned(Primitive::Byte),
        "char" => interned(Primitive::Char),
        "short" => interned(Primitive::Int16),
        "int" => interned(Primitive::Int),
        "long" => interned(Primitive::Int64),
        "float" => interned(Primitive::Float32),
        "double" => interned(Primitive::Float64),
        "string" => interned(Primitive::Str),
        other => {
            return Err(TranslateError::invariant(format!(
                "Unrecognized primitive type {}",
                other
            )))
        }
    };

    if dims == 0 {
        return Ok(base);
    }

    Ok(Arc::new(TypeData::Array {
        elem: Some(base),
        dims,
    }))
}

/// Classify a class or interface name. The type dictionary decides which:
/// a name the configuration lists as an interface becomes interface-typed,
/// anything else is a class.
pub fn classify_object(tdict: &dyn TypeDict, typename: &str, dims: usize) -> Arc<TypeData> {
    let td = match tdict.imported_type(typename) {
        None => Arc::new(TypeData::Class(typename.to_string())),
        Some(imported) => {
            if tdict.is_interface(&imported) {
                Arc::new(TypeData::Interface(imported))
            } else {
                Arc::new(TypeData::Class(imported))
            }
        }
    };

    if dims > 0 {
        return Arc::new(TypeData::Array {
            elem: Some(td),
            dims,
        });
    }

    td
}

impl TypeData {
    pub fn is_class(&self, name: &str) -> bool {
        matches!(self, TypeData::Class(n) if n == name)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeData::Array { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeData::Primitive(Primitive::Str))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeData::Class(_) | TypeData::Interface(_))
    }

    /// The Go type syntax: `*Name` for classes, bare name for interfaces
    /// and primitives, `[]elem` per array dimension, `map[K]V` for maps.
    /// `void` has no type expression.
    pub fn type_expr(&self) -> Option<GoExpr> {
        match self {
            TypeData::Primitive(Primitive::Void) => None,
            TypeData::Primitive(Primitive::GenericObject) => Some(GoExpr::EmptyInterface),
            TypeData::Primitive(p) => Some(GoExpr::ident(p.go_name())),
            TypeData::Array { elem, dims } => {
                let mut inner = match elem {
                    Some(e) => e.type_expr().unwrap_or(GoExpr::EmptyInterface),
                    None => GoExpr::EmptyInterface,
                };
                for _ in 0..(*dims).max(1) {
                    inner = GoExpr::ArrayType {
                        elt: Box::new(inner),
                    };
                }
                Some(inner)
            }
            TypeData::Map { key, value } => {
                let k = key
                    .as_ref()
                    .and_then(|k| k.type_expr())
                    .unwrap_or(GoExpr::EmptyInterface);
                let v = value
                    .as_ref()
                    .and_then(|v| v.type_expr())
                    .unwrap_or(GoExpr::EmptyInterface);
                Some(GoExpr::MapType {
                    key: Box::new(k),
                    value: Box::new(v),
                })
            }
            TypeData::Class(name) => Some(GoExpr::Star(Box::new(GoExpr::ident(name.clone())))),
            TypeData::Interface(name) => Some(GoExpr::ident(name.clone())),
        }
    }

    /// A flat, identifier-safe name, used when generating fresh names.
    pub fn name(&self) -> String {
        match self {
            TypeData::Primitive(p) => p.go_name().to_string(),
            TypeData::Array { elem, dims } => {
                let mut s = String::from("array");
                match elem {
                    None => s.push_str("_Object"),
                    Some(e) => {
                        s.push('_');
                        s.push_str(&e.render());
                    }
                }
                if *dims > 0 {
                    s.push_str(&format!("_dim{}", dims));
                }
                s
            }
            TypeData::Map { key, value } => {
                let mut s = String::from("map");
                match key {
                    None => s.push_str("_Object"),
                    Some(k) => {
                        s.push('_');
                        s.push_str(&k.render());
                    }
                }
                match value {
                    None => s.push_str("_Object"),
                    Some(v) => {
                        s.push('_');
                        s.push_str(&v.render());
                    }
                }
                s
            }
            TypeData::Class(name) | TypeData::Interface(name) => name.clone(),
        }
    }

    /// The human-readable Go type spelling, used in diagnostics.
    pub fn render(&self) -> String {
        match self {
            TypeData::Primitive(p) => p.go_name().to_string(),
            TypeData::Array { elem, dims } => {
                let inner = match elem {
                    Some(e) => e.render(),
                    None => generic_object().render(),
                };
                let mut s = String::new();
                for _ in 0..(*dims).max(1) {
                    s.push_str("[]");
                }
                s + &inner
            }
            TypeData::Map { key, value } => {
                let k = key.as_ref().map(|k| k.render()).unwrap_or_else(|| generic_object().render());
                let v = value.as_ref().map(|v| v.render()).unwrap_or_else(|| generic_object().render());
                format!("map[{}]{}", k, v)
            }
            TypeData::Class(name) => format!("*{}", name),
            TypeData::Interface(name) => name.clone(),
        }
    }
}

/// Structural equality over optional types; `None` never equals anything,
/// mirroring the lookup rules (an untyped argument matches no overload).
pub fn type_eq(a: Option<&Arc<TypeData>>, b: Option<&Arc<TypeData>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyDict;
    impl TypeDict for EmptyDict {
        fn imported_type(&self, _name: &str) -> Option<String> {
            None
        }
        fn is_interface(&self, _name: &str) -> bool {
            false
        }
    }

    struct IfaceDict;
    impl TypeDict for IfaceDict {
        fn imported_type(&self, name: &str) -> Option<String> {
            Some(name.to_string())
        }
        fn is_interface(&self, name: &str) -> bool {
            name == "Runnable"
        }
    }

    #[test]
    fn primitive_interning() {
        let a = classify_primitive("int", 0).unwrap();
        let b = classify_primitive("int", 0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let s = classify_primitive("String", 0).unwrap();
        assert!(Arc::ptr_eq(&s, &string_type()));
    }

    #[test]
    fn primitive_mapping() {
        assert_eq!(classify_primitive("boolean", 0).unwrap().render(), "bool");
        assert_eq!(classify_primitive("short", 0).unwrap().render(), "int16");
        assert_eq!(classify_primitive("long", 0).unwrap().render(), "int64");
        assert_eq!(classify_primitive("float", 0).unwrap().render(), "float32");
        assert_eq!(classify_primitive("double", 0).unwrap().render(), "float64");
        assert!(classify_primitive("object", 0).is_err());
    }

    #[test]
    fn array_wrapping() {
        let td = classify_primitive("int", 2).unwrap();
        assert_eq!(td.render(), "[][]int");
        assert_eq!(td.name(), "array_int_dim2");
    }

    #[test]
    fn object_classification() {
        let cls = classify_object(&EmptyDict, "Foo", 0);
        assert_eq!(cls.render(), "*Foo");
        assert!(cls.is_class("Foo"));

        let iface = classify_object(&IfaceDict, "Runnable", 0);
        assert_eq!(iface.render(), "Runnable");
        assert!(iface.is_object());
    }

    #[test]
    fn equality_is_equivalence() {
        let a = classify_primitive("int", 1).unwrap();
        let b = classify_primitive("int", 1).unwrap();
        let c = classify_primitive("int", 1).unwrap();

        // reflexive, symmetric, transitive
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);

        let other = classify_primitive("long", 1).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn untyped_matches_nothing() {
        let a = classify_primitive("int", 0).unwrap();
        assert!(!type_eq(Some(&a), None));
        assert!(!type_eq(None, None));
        assert!(type_eq(Some(&a), Some(&int_type())));
    }

    #[test]
    fn void_has_no_expr() {
        assert!(classify_primitive("void", 0).unwrap().type_expr().is_none());
    }

    #[test]
    fn map_rendering() {
        let td = TypeData::Map {
            key: Some(string_type()),
            value: None,
        };
        assert_eq!(td.render(), "map[string]interface{}");
        assert_eq!(td.name(), "map_string_Object");
    }
}

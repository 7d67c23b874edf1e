//! Methods: real class methods, interface signatures, fakes for external
//! or built-in functions, and forward references bound at finalize time.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use j2go_goast::ast::{Block as GoBlock, Decl as GoDecl, Expr as GoExpr, Field, FuncType};

use super::stmt::Block;
use super::var::Var;
use crate::typedata::{type_eq, TypeData};

/// How a method is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Test,
    Constructor,
    Static,
    Instance,
    Interface,
    Main,
}

/// A method with a real body, owned by a class definition.
#[derive(Debug)]
pub struct ClassMethod {
    /// Name of the owning class; used for receiver and result types.
    pub class_name: String,
    pub name: String,
    pub go_name: String,
    pub ret: Option<Arc<TypeData>>,
    pub rcvr: Option<Var>,
    pub kind: MethodKind,
    pub params: Vec<Var>,
    pub body: Option<Block>,
}

/// An interface method signature.
#[derive(Debug)]
pub struct IfaceMethod {
    pub name: String,
    pub go_name: String,
    pub params: Vec<Var>,
    pub ret: Option<Arc<TypeData>>,
}

/// A stand-in for a method the translator did not define: Go built-ins
/// (`len`, `append`) and external-package functions (`fmt.Sprintf`).
#[derive(Debug)]
pub struct FakeMethod {
    pub class_name: Option<String>,
    pub name: String,
    pub go_name: String,
    pub ret: Option<Arc<TypeData>>,
}

impl FakeMethod {
    pub fn new(class_name: Option<&str>, name: &str, ret: Option<Arc<TypeData>>) -> FakeMethod {
        FakeMethod {
            class_name: class_name.map(str::to_string),
            name: name.to_string(),
            go_name: name.to_string(),
            ret,
        }
    }
}

/// A call site seen before (or without) the method's declaration. The
/// argument type vector is kept for overload matching; `resolved` is
/// filled in when the real declaration arrives.
#[derive(Debug)]
pub struct MethodReference {
    pub class_name: Option<String>,
    pub name: String,
    pub go_name: String,
    pub arg_types: Vec<Option<Arc<TypeData>>>,
    pub resolved: Option<MethodRc>,
}

#[derive(Debug)]
pub enum Method {
    Class(ClassMethod),
    Iface(IfaceMethod),
    Fake(FakeMethod),
    Reference(MethodReference),
}

pub type MethodRc = Rc<RefCell<Method>>;

pub fn new_method(m: Method) -> MethodRc {
    Rc::new(RefCell::new(m))
}

pub fn fake_method(class_name: Option<&str>, name: &str, ret: Option<Arc<TypeData>>) -> MethodRc {
    new_method(Method::Fake(FakeMethod::new(class_name, name, ret)))
}

impl Method {
    pub fn name(&self) -> String {
        match self {
            Method::Class(m) => m.name.clone(),
            Method::Iface(m) => m.name.clone(),
            Method::Fake(m) => m.name.clone(),
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().name(),
                None => r.name.clone(),
            },
        }
    }

    pub fn go_name(&self) -> String {
        match self {
            Method::Class(m) => m.go_name.clone(),
            Method::Iface(m) => m.go_name.clone(),
            Method::Fake(m) => m.go_name.clone(),
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().go_name(),
                None => r.go_name.clone(),
            },
        }
    }

    pub fn set_go_name(&mut self, new_name: &str) {
        match self {
            Method::Class(m) => m.go_name = new_name.to_string(),
            Method::Iface(m) => m.go_name = new_name.to_string(),
            Method::Fake(m) => m.go_name = new_name.to_string(),
            Method::Reference(r) => {
                if let Some(m) = &r.resolved {
                    m.borrow_mut().set_go_name(new_name);
                }
                r.go_name = new_name.to_string();
            }
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Method::Class(m) => m.kind,
            Method::Iface(_) => MethodKind::Interface,
            Method::Fake(_) => MethodKind::Instance,
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().kind(),
                None => MethodKind::Instance,
            },
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            Method::Class(m) => m.params.len(),
            Method::Iface(m) => m.params.len(),
            Method::Fake(_) => 0,
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().num_params(),
                None => r.arg_types.len(),
            },
        }
    }

    pub fn receiver_var(&self) -> Option<Var> {
        match self {
            Method::Class(m) if m.kind == MethodKind::Instance => m.rcvr.clone(),
            Method::Reference(r) => r
                .resolved
                .as_ref()
                .and_then(|m| m.borrow().receiver_var()),
            _ => None,
        }
    }

    /// The class-name qualifier for call emission, when one applies
    /// (external fakes and unresolved references).
    pub fn qualifier(&self) -> Option<String> {
        match self {
            Method::Fake(m) => m.class_name.clone(),
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().qualifier(),
                None => r.class_name.clone(),
            },
            _ => None,
        }
    }

    /// The owner class name, for rule matching.
    pub fn class_name(&self) -> Option<String> {
        match self {
            Method::Class(m) => Some(m.class_name.clone()),
            Method::Iface(_) => None,
            Method::Fake(m) => m.class_name.clone(),
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().class_name(),
                None => r.class_name.clone(),
            },
        }
    }

    /// The return type (`VarType` of a call through this method).
    pub fn var_type(&self) -> Option<Arc<TypeData>> {
        match self {
            Method::Class(m) => m.ret.clone(),
            Method::Iface(m) => m.ret.clone(),
            Method::Fake(m) => m.ret.clone(),
            Method::Reference(r) => r.resolved.as_ref().and_then(|m| m.borrow().var_type()),
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Block> {
        match self {
            Method::Class(m) => m.body.as_mut(),
            _ => None,
        }
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, Method::Reference(r) if r.resolved.is_none())
    }

    /// Overload lookup: does this method accept the given argument types?
    pub fn has_arguments(&self, arg_types: &[Option<Arc<TypeData>>]) -> bool {
        match self {
            Method::Class(m) => {
                m.params.len() == arg_types.len()
                    && m.params.iter().zip(arg_types).all(|(p, a)| {
                        type_eq(p.borrow().var_type().as_ref(), a.as_ref())
                    })
            }
            Method::Iface(_) => false,
            // Built-in and external fakes accept whatever they are given.
            Method::Fake(_) => true,
            Method::Reference(r) => match &r.resolved {
                Some(m) => m.borrow().has_arguments(arg_types),
                None => {
                    r.arg_types.len() == arg_types.len()
                        && r.arg_types
                            .iter()
                            .zip(arg_types)
                            .all(|(a, b)| type_eq(a.as_ref(), b.as_ref()))
                }
            },
        }
    }

    /// Collision predicate: same simple name, same parameter arity.
    pub fn is_method(&self, name: &str, num_params: usize) -> bool {
        self.name() == name && self.num_params() == num_params
    }

    /// Emit the top-level declaration, if this method produces one.
    pub fn decl(&self) -> Option<GoDecl> {
        match self {
            Method::Class(m) => Some(m.decl()),
            _ => None,
        }
    }

    /// Emit the interface-field form, if this method produces one.
    pub fn iface_field(&self) -> Option<(String, FuncType)> {
        match self {
            Method::Iface(m) => Some((m.go_name.clone(), m.func_type())),
            _ => None,
        }
    }
}

impl ClassMethod {
    fn star_class(&self) -> GoExpr {
        GoExpr::Star(Box::new(GoExpr::Ident(self.class_name.clone())))
    }

    fn param_fields(&self) -> Vec<Field> {
        if self.kind == MethodKind::Test {
            return vec![Field::named(
                "t",
                GoExpr::Star(Box::new(GoExpr::selector(GoExpr::ident("testing"), "T"))),
            )];
        }

        self.params
            .iter()
            .map(|p| {
                let pb = p.borrow();
                Field::named(
                    pb.go_name(),
                    pb.type_expr().unwrap_or(GoExpr::EmptyInterface),
                )
            })
            .collect()
    }

    fn result_fields(&self) -> Vec<Field> {
        match self.kind {
            MethodKind::Constructor => vec![Field::anon(self.star_class())],
            _ => match &self.ret {
                Some(td) => match td.type_expr() {
                    Some(ty) => vec![Field::anon(ty)],
                    None => vec![],
                },
                None => vec![],
            },
        }
    }

    fn recv_field(&self) -> Option<Field> {
        if self.kind != MethodKind::Instance {
            return None;
        }

        let name = self
            .rcvr
            .as_ref()
            .map(|r| r.borrow().go_name())
            .unwrap_or_else(|| "rcvr".to_string());
        Some(Field::named(name, self.star_class()))
    }

    pub fn decl(&self) -> GoDecl {
        let body = self.body.as_ref().map(|b| GoBlock::new(b.emit_list()));

        GoDecl::Func {
            name: self.go_name.clone(),
            recv: self.recv_field(),
            ftype: FuncType {
                params: self.param_fields(),
                results: self.result_fields(),
            },
            body,
        }
    }
}

impl IfaceMethod {
    pub fn func_type(&self) -> FuncType {
        FuncType {
            params: self
                .params
                .iter()
                .map(|p| {
                    let pb = p.borrow();
                    Field::named(
                        pb.go_name(),
                        pb.type_expr().unwrap_or(GoExpr::EmptyInterface),
                    )
                })
                .collect(),
            results: match &self.ret {
                Some(td) => match td.type_expr() {
                    Some(ty) => vec![Field::anon(ty)],
                    None => vec![],
                },
                None => vec![],
            },
        }
    }
}

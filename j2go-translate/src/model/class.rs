//! Class-like owners: definitions, forward references, fakes for external
//! package types, and the nil owner.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use j2go_goast::ast::{Decl as GoDecl, Expr as GoExpr, Field, ValueSpec};
use j2go_goast::token::AssignOp;
use tracing::warn;

use super::expr::{Assign, Expr};
use super::interfaces::InterfaceRc;
use super::method::{new_method, ClassMethod, Method, MethodKind, MethodRc};
use super::stmt::{Block, Stmt};
use super::var::{new_var, var_eq, Var, VarData, VarInit, VarInitRc, VarKind};
use crate::methodmap::MethodMap;
use crate::name::TypeName;
use crate::typedata::{self, TypeData};

/// A class or interface constant.
#[derive(Debug)]
pub struct Constant {
    pub name: String,
    pub ty: Arc<TypeData>,
    pub init: Option<VarInitRc>,
}

pub type ConstRc = Rc<RefCell<Constant>>;

impl Constant {
    pub fn decl(&self) -> GoDecl {
        GoDecl::Const {
            specs: vec![ValueSpec {
                names: vec![self.name.clone()],
                ty: self.ty.type_expr(),
                values: self.init.iter().map(|vi| vi.borrow().emit()).collect(),
            }],
        }
    }
}

/// A class with a real body.
#[derive(Debug, Default)]
pub struct ClassDef {
    pub name: String,
    pub parent_key: Option<String>,
    pub super_class: Option<ClassRc>,
    pub interfaces: Vec<InterfaceRc>,
    pub constants: Vec<ConstRc>,
    pub statics: Vec<VarInitRc>,
    pub vars: Vec<VarInitRc>,
    pub methods: MethodMap,
}

/// A class seen only through allocations or casts so far; fulfilled in
/// place when the declaration arrives.
#[derive(Debug, Default)]
pub struct ClassReference {
    pub name: String,
    pub parent_key: Option<String>,
    pub methods: MethodMap,
}

/// An external package type; owns methods for dispatch but never emits.
#[derive(Debug, Default)]
pub struct FakeClass {
    pub name: String,
    pub package: Option<String>,
    pub methods: MethodMap,
}

#[derive(Debug)]
pub enum Class {
    Def(ClassDef),
    Ref(ClassReference),
    Fake(FakeClass),
    /// Placeholder owner when a method has no class context.
    Nil,
}

pub type ClassRc = Rc<RefCell<Class>>;

pub fn new_class(c: Class) -> ClassRc {
    Rc::new(RefCell::new(c))
}

pub fn class_key(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) if !p.is_empty() => format!("{}.{}", p, name),
        _ => name.to_string(),
    }
}

impl Class {
    pub fn name(&self) -> String {
        match self {
            Class::Def(d) => d.name.clone(),
            Class::Ref(r) => r.name.clone(),
            Class::Fake(f) => f.name.clone(),
            Class::Nil => String::new(),
        }
    }

    pub fn key(&self) -> String {
        match self {
            Class::Def(d) => class_key(d.parent_key.as_deref(), &d.name),
            Class::Ref(r) => class_key(r.parent_key.as_deref(), &r.name),
            Class::Fake(f) => class_key(None, &f.name),
            Class::Nil => String::new(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Class::Nil)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Class::Ref(_))
    }

    pub fn super_name(&self) -> Option<String> {
        match self {
            Class::Def(d) => d.super_class.as_ref().map(|s| s.borrow().name()),
            _ => None,
        }
    }

    pub fn add_method(&mut self, m: MethodRc) {
        match self {
            Class::Def(d) => d.methods.add_method(m),
            Class::Ref(r) => r.methods.add_method(m),
            Class::Fake(f) => f.methods.add_method(m),
            Class::Nil => warn!("Cannot add method to nil owner"),
        }
    }

    pub fn find_method(
        &self,
        name: &str,
        arg_types: &[Option<Arc<TypeData>>],
    ) -> Option<MethodRc> {
        match self {
            Class::Def(d) => d.methods.find_method(name, arg_types),
            Class::Ref(r) => r.methods.find_method(name, arg_types),
            Class::Fake(f) => f.methods.find_method(name, arg_types),
            Class::Nil => None,
        }
    }

    pub fn add_constant(&mut self, con: ConstRc) {
        match self {
            Class::Def(d) => d.constants.push(con),
            _ => warn!("Cannot add constant to {:?}", self),
        }
    }

    /// Search constants, implemented interfaces, then the superclass.
    pub fn find_variable(&self, name: &TypeName) -> Option<Var> {
        let d = match self {
            Class::Def(d) => d,
            _ => return None,
        };

        let text = name.to_string();
        for con in &d.constants {
            if con.borrow().name == text {
                return Some(new_var(VarKind::Constant(con.clone())));
            }
        }

        for iface in &d.interfaces {
            if let Some(v) = iface.borrow().find_variable(name) {
                return Some(v);
            }
        }

        if let Some(sup) = &d.super_class {
            return sup.borrow().find_variable(name);
        }

        None
    }

    /// Emit the const declarations this class contributes.
    pub fn constant_decls(&self) -> Vec<GoDecl> {
        match self {
            Class::Def(d) => d.constants.iter().map(|c| c.borrow().decl()).collect(),
            _ => vec![],
        }
    }

    /// Emit the package-level var declarations for static fields.
    pub fn static_decls(&self) -> Vec<GoDecl> {
        let d = match self {
            Class::Def(d) => d,
            _ => return vec![],
        };

        d.statics
            .iter()
            .map(|vi| {
                let vib = vi.borrow();
                let var = vib.var.as_ref().expect("static without variable");
                let vb = var.borrow();

                let keep_init = matches!(vib.expr, Some(Expr::Literal(_)));
                if vib.has_initializer() && !keep_init {
                    warn!(
                        "dropping non-literal initializer for static {}",
                        vb.name()
                    );
                }

                let (ty, values) = if keep_init {
                    (None, vec![vib.emit()])
                } else {
                    (
                        Some(vb.type_expr().unwrap_or(GoExpr::EmptyInterface)),
                        vec![],
                    )
                };

                GoDecl::Var {
                    specs: vec![ValueSpec {
                        names: vec![vb.go_name()],
                        ty,
                        values,
                    }],
                }
            })
            .collect()
    }

    /// The struct type declaration plus every method declaration.
    pub fn decls(&self) -> Vec<GoDecl> {
        let d = match self {
            Class::Def(d) => d,
            _ => return vec![],
        };

        let mut fields = Vec::new();
        if let Some(sup) = &d.super_class {
            fields.push(Field::anon(GoExpr::Star(Box::new(GoExpr::Ident(
                sup.borrow().name(),
            )))));
        }
        for vi in &d.vars {
            let vib = vi.borrow();
            if let Some(var) = &vib.var {
                let vb = var.borrow();
                fields.push(Field::named(
                    vb.go_name(),
                    vb.type_expr().unwrap_or(GoExpr::EmptyInterface),
                ));
            }
        }

        let mut decls = vec![GoDecl::Type {
            name: d.name.clone(),
            ty: GoExpr::StructType(fields),
        }];

        let mut methods: Vec<(String, GoDecl)> = d
            .methods
            .all()
            .iter()
            .filter_map(|m| {
                let mb = m.borrow();
                mb.decl().map(|decl| (mb.go_name(), decl))
            })
            .collect();
        methods.sort_by(|a, b| a.0.cmp(&b.0));
        decls.extend(methods.into_iter().map(|(_, d)| d));

        decls
    }
}

impl ClassDef {
    pub fn new(name: &str, parent_key: Option<String>) -> ClassDef {
        ClassDef {
            name: name.to_string(),
            parent_key,
            ..ClassDef::default()
        }
    }

    /// File a field initializer where it belongs: `final` with a literal
    /// initializer becomes a constant, `static` becomes a package var,
    /// everything else is a struct field.
    pub fn add_var(&mut self, vi: VarInit) {
        let var = vi.var.clone().expect("class field without variable");
        let (go_name, var_type, is_static, is_final) = {
            let vb = var.borrow();
            (vb.go_name(), vb.var_type(), vb.is_static(), vb.is_final())
        };

        if is_final && vi.expr.is_some() {
            if matches!(vi.expr, Some(Expr::Literal(_))) {
                self.constants.push(Rc::new(RefCell::new(Constant {
                    name: go_name,
                    ty: var_type.unwrap_or_else(typedata::generic_object),
                    init: Some(Rc::new(RefCell::new(vi))),
                })));
                return;
            }
            warn!("Ignoring non-literal constant initializer for {}", go_name);
        }

        if is_static {
            self.statics.push(Rc::new(RefCell::new(vi)));
            return;
        }

        self.vars.push(Rc::new(RefCell::new(vi)));
    }
}

/// Post-processing once a class body is complete: move field initializers
/// into every constructor (synthesizing one if none exist), then renumber
/// duplicate method names.
pub fn finalize_class(cls: &ClassRc, receiver: &str) {
    if !matches!(&*cls.borrow(), Class::Def(_)) {
        return;
    }

    internalize_var_inits(cls, receiver);

    if let Class::Def(d) = &mut *cls.borrow_mut() {
        d.methods.renumber_duplicates();
    }
}

fn internalize_var_inits(cls: &ClassRc, receiver: &str) {
    let (mut ctors, init_vars, class_name) = {
        let b = cls.borrow();
        let d = match &*b {
            Class::Def(d) => d,
            _ => return,
        };

        let ctors: Vec<MethodRc> = d
            .methods
            .all()
            .into_iter()
            .filter(|m| m.borrow().kind() == MethodKind::Constructor)
            .collect();
        let init_vars: Vec<VarInitRc> = d
            .vars
            .iter()
            .filter(|vi| vi.borrow().has_initializer())
            .cloned()
            .collect();

        (ctors, init_vars, d.name.clone())
    };

    if ctors.is_empty() {
        let ctor = create_constructor(receiver, &class_name);
        cls.borrow_mut().add_method(ctor.clone());
        ctors.push(ctor);
    }

    if init_vars.is_empty() {
        return;
    }

    for m in &ctors {
        let mut mb = m.borrow_mut();
        let cm = match &mut *mb {
            Method::Class(c) => c,
            _ => continue,
        };
        let rcvr = match &cm.rcvr {
            Some(r) => r.clone(),
            None => continue,
        };
        let body = match &mut cm.body {
            Some(b) => b,
            None => continue,
        };

        // which initialized fields does this constructor already assign?
        let mut pending: Vec<Option<VarInitRc>> = init_vars.iter().cloned().map(Some).collect();
        for stmt in &body.stmts {
            if let Stmt::Assign(a) = stmt {
                if a.op != AssignOp::Assign || var_eq(&a.lhs, &rcvr) {
                    continue;
                }
                for slot in pending.iter_mut() {
                    let hit = slot
                        .as_ref()
                        .and_then(|vi| vi.borrow().var.clone())
                        .map(|v| var_eq(&v, &a.lhs))
                        .unwrap_or(false);
                    if hit {
                        *slot = None;
                        break;
                    }
                }
            }
        }

        let pending: Vec<VarInitRc> = pending.into_iter().flatten().collect();
        if pending.is_empty() {
            continue;
        }

        // fixups go right after the receiver-create statement
        let create_idx = body.stmts.iter().position(|s| match s {
            Stmt::Assign(a) => var_eq(&a.lhs, &rcvr),
            _ => false,
        });

        if let Some(idx) = create_idx {
            let fixups: Vec<Stmt> = pending
                .iter()
                .map(|vi| {
                    let field = vi.borrow().var.clone().expect("field init without variable");
                    let sel = new_var(VarKind::Selector {
                        x: rcvr.clone(),
                        sel: field,
                    });
                    Stmt::Assign(Assign {
                        lhs: sel,
                        op: AssignOp::Assign,
                        rhs: vec![Expr::VarInitExpr(vi.clone())],
                    })
                })
                .collect();
            body.stmts.splice(idx + 1..idx + 1, fixups);
        }
    }
}

/// The generated `New<Class>()` constructor for a class that declares none.
fn create_constructor(receiver: &str, class_name: &str) -> MethodRc {
    let rcvr = new_var(VarKind::Data(VarData {
        receiver: String::new(),
        name: receiver.to_string(),
        go_name: receiver.to_string(),
        var_type: None,
        class_field: false,
        is_static: false,
        is_final: false,
    }));

    let body = Block::new(vec![
        Stmt::Assign(Assign {
            lhs: rcvr.clone(),
            op: AssignOp::Define,
            rhs: vec![Expr::StructRef {
                class: class_name.to_string(),
            }],
        }),
        Stmt::Return(Some(Expr::Var(rcvr.clone()))),
    ]);

    new_method(Method::Class(ClassMethod {
        class_name: class_name.to_string(),
        name: format!("New{}", class_name),
        go_name: format!("New{}", class_name),
        ret: None,
        rcvr: Some(rcvr),
        kind: MethodKind::Constructor,
        params: vec![],
        body: Some(body),
    }))
}

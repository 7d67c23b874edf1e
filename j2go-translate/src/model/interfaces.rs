//! Interfaces: named method-signature sets plus interface constants.

use std::cell::RefCell;
use std::rc::Rc;

use j2go_goast::ast::{Decl as GoDecl, Expr as GoExpr};

use super::class::ConstRc;
use super::var::{new_var, Var, VarKind};
use crate::methodmap::MethodMap;
use crate::name::TypeName;

/// A declared interface.
#[derive(Debug, Default)]
pub struct InterfaceDef {
    pub name: String,
    pub methods: MethodMap,
    pub constants: Vec<ConstRc>,
}

/// An interface named in an `implements` list before (or without) its
/// declaration.
#[derive(Debug)]
pub struct InterfaceRef {
    pub name: TypeName,
}

#[derive(Debug)]
pub enum Interface {
    Def(InterfaceDef),
    Ref(InterfaceRef),
}

pub type InterfaceRc = Rc<RefCell<Interface>>;

pub fn new_interface(i: Interface) -> InterfaceRc {
    Rc::new(RefCell::new(i))
}

impl Interface {
    pub fn name(&self) -> String {
        match self {
            Interface::Def(d) => d.name.clone(),
            Interface::Ref(r) => r.name.to_string(),
        }
    }

    pub fn matches(&self, name: &TypeName) -> bool {
        let own = self.name();
        name.to_string() == own || name.last_type() == own
    }

    pub fn find_variable(&self, name: &TypeName) -> Option<Var> {
        let d = match self {
            Interface::Def(d) => d,
            Interface::Ref(_) => return None,
        };

        let text = name.to_string();
        for con in &d.constants {
            if con.borrow().name == text {
                return Some(new_var(VarKind::Constant(con.clone())));
            }
        }

        None
    }

    /// Emit the interface-level constants as individual const decls.
    pub fn constant_decls(&self) -> Vec<GoDecl> {
        match self {
            Interface::Def(d) => d.constants.iter().map(|c| c.borrow().decl()).collect(),
            Interface::Ref(_) => vec![],
        }
    }

    /// Emit the interface type declaration; references emit nothing.
    pub fn decl(&self) -> Option<GoDecl> {
        let d = match self {
            Interface::Def(d) => d,
            Interface::Ref(_) => return None,
        };

        let methods: Vec<(String, j2go_goast::ast::FuncType)> = d
            .methods
            .all()
            .iter()
            .filter_map(|m| m.borrow().iface_field())
            .collect();

        Some(GoDecl::Type {
            name: d.name.clone(),
            ty: GoExpr::InterfaceType(methods),
        })
    }

    pub fn finalize(&mut self) {
        if let Interface::Def(d) = self {
            d.methods.renumber_duplicates();
        }
    }
}

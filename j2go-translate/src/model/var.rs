//! Variable references: named, typed locations in the model.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use j2go_goast::ast::Expr as GoExpr;
use tracing::warn;

use super::class::ConstRc;
use super::expr::Expr;
use crate::typedata::TypeData;

/// A shared, mutable variable reference.
pub type Var = Rc<RefCell<VarKind>>;

/// A field initializer (or local array initializer): the variable, plus
/// either a single expression or a brace list of element expressions.
#[derive(Debug)]
pub struct VarInit {
    pub var: Option<Var>,
    pub expr: Option<Expr>,
    pub elements: Vec<Expr>,
}

/// Initializers are shared between the class (struct layout) and every
/// constructor body they are copied into.
pub type VarInitRc = Rc<RefCell<VarInit>>;

impl VarInit {
    pub fn has_initializer(&self) -> bool {
        self.expr.is_some() || !self.elements.is_empty()
    }

    /// Emit the initializer value expression.
    pub fn emit(&self) -> GoExpr {
        if let Some(expr) = &self.expr {
            return expr.emit();
        }

        let ty = self
            .var
            .as_ref()
            .and_then(|v| v.borrow().type_expr())
            .map(Box::new);
        GoExpr::Composite {
            ty,
            elts: self.elements.iter().map(Expr::emit).collect(),
        }
    }

    pub fn has_variable(&self, var: &Var) -> bool {
        if let Some(v) = &self.var {
            if var_eq(v, var) {
                return true;
            }
        }
        if let Some(e) = &self.expr {
            if e.has_variable(var) {
                return true;
            }
        }
        self.elements.iter().any(|e| e.has_variable(var))
    }
}

/// Core variable data: the declared name, the Go name derived from it,
/// the declared type and the shape flags.
#[derive(Debug)]
pub struct VarData {
    pub receiver: String,
    pub name: String,
    pub go_name: String,
    pub var_type: Option<Arc<TypeData>>,
    pub class_field: bool,
    pub is_static: bool,
    pub is_final: bool,
}

/// `base[index]`; usable both as an expression and as an assignment target.
#[derive(Debug)]
pub struct ArrayIndex {
    pub base: Option<Var>,
    pub obj: Option<Box<Expr>>,
    pub index: Box<Expr>,
}

/// The variable-reference variants.
#[derive(Debug)]
pub enum VarKind {
    Data(VarData),
    /// A variable plus a dotted suffix (`obj.field`).
    Attribute { base: Var, suffix: String },
    /// A name that resolved to nothing; emitted verbatim.
    Fake { name: String, dims: usize },
    /// `x.sel` where both sides are variables (`rcvr.field`).
    Selector { x: Var, sel: Var },
    /// `expr.name`, which has no Go mapping; emits a placeholder.
    ObjectDotName { x: Box<Expr>, ref_var: Var },
    Index(ArrayIndex),
    /// A class or interface constant found during lookup.
    Constant(ConstRc),
}

pub fn new_var(kind: VarKind) -> Var {
    Rc::new(RefCell::new(kind))
}

pub fn fake_var(name: &str, dims: usize) -> Var {
    new_var(VarKind::Fake {
        name: name.to_string(),
        dims,
    })
}

impl VarKind {
    pub fn name(&self) -> String {
        match self {
            VarKind::Data(d) => d.name.clone(),
            VarKind::Attribute { base, suffix } => {
                format!("{}.{}", base.borrow().name(), suffix)
            }
            VarKind::Fake { name, .. } => name.clone(),
            VarKind::Selector { sel, .. } => sel.borrow().name(),
            VarKind::ObjectDotName { .. } => self.go_name(),
            VarKind::Index(ai) => match &ai.base {
                Some(b) => b.borrow().name(),
                None => String::new(),
            },
            VarKind::Constant(c) => c.borrow().name.clone(),
        }
    }

    pub fn go_name(&self) -> String {
        match self {
            VarKind::Data(d) => d.go_name.clone(),
            VarKind::Attribute { base, suffix } => {
                format!("{}.{}", base.borrow().go_name(), suffix)
            }
            VarKind::Fake { name, .. } => name.clone(),
            VarKind::Selector { sel, .. } => sel.borrow().go_name(),
            VarKind::ObjectDotName { .. } => "<<unimp_obj.nm>>".to_string(),
            VarKind::Index(ai) => match &ai.base {
                Some(b) => b.borrow().go_name(),
                None => String::new(),
            },
            VarKind::Constant(c) => c.borrow().name.clone(),
        }
    }

    pub fn set_go_name(&mut self, new_name: &str) {
        match self {
            VarKind::Data(d) => d.go_name = new_name.to_string(),
            VarKind::Attribute { base, .. } => base.borrow_mut().set_go_name(new_name),
            VarKind::Fake { name, .. } => *name = new_name.to_string(),
            VarKind::Selector { sel, .. } => sel.borrow_mut().set_go_name(new_name),
            _ => warn!("Cannot change Go name of {:?}", self),
        }
    }

    pub fn receiver(&self) -> String {
        match self {
            VarKind::Data(d) => d.receiver.clone(),
            VarKind::Attribute { base, .. } => base.borrow().receiver(),
            VarKind::Selector { sel, .. } => sel.borrow().receiver(),
            VarKind::Index(ai) => match &ai.base {
                Some(b) => b.borrow().receiver(),
                None => String::new(),
            },
            _ => String::new(),
        }
    }

    pub fn var_type(&self) -> Option<Arc<TypeData>> {
        match self {
            VarKind::Data(d) => d.var_type.clone(),
            VarKind::Attribute { base, .. } => base.borrow().var_type(),
            VarKind::Selector { sel, .. } => sel.borrow().var_type(),
            VarKind::Constant(c) => Some(c.borrow().ty.clone()),
            _ => None,
        }
    }

    pub fn is_class_field(&self) -> bool {
        match self {
            VarKind::Data(d) => d.class_field,
            VarKind::Attribute { base, .. } => base.borrow().is_class_field(),
            VarKind::Selector { sel, .. } => sel.borrow().is_class_field(),
            _ => false,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            VarKind::Data(d) => d.is_static,
            VarKind::Attribute { base, .. } => base.borrow().is_static(),
            VarKind::Constant(_) => true,
            _ => false,
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            VarKind::Data(d) => d.is_final,
            VarKind::Attribute { base, .. } => base.borrow().is_final(),
            VarKind::Constant(_) => true,
            _ => false,
        }
    }

    /// The expression form: fields select through their receiver.
    pub fn expr(&self) -> GoExpr {
        match self {
            VarKind::Data(d) => {
                if d.receiver.is_empty() || d.is_static {
                    GoExpr::ident(d.go_name.clone())
                } else {
                    GoExpr::selector(GoExpr::ident(d.receiver.clone()), d.go_name.clone())
                }
            }
            VarKind::Attribute { base, suffix } => {
                GoExpr::selector(base.borrow().expr(), suffix.clone())
            }
            VarKind::Fake { name, dims } => {
                let mut e = GoExpr::ident(name.clone());
                for _ in 0..*dims {
                    e = GoExpr::ArrayType { elt: Box::new(e) };
                }
                e
            }
            VarKind::Selector { x, sel } => {
                GoExpr::selector(x.borrow().expr(), sel.borrow().go_name())
            }
            VarKind::ObjectDotName { .. } => GoExpr::ident(self.go_name()),
            VarKind::Index(ai) => {
                let x = match (&ai.base, &ai.obj) {
                    (Some(b), _) => b.borrow().expr(),
                    (None, Some(o)) => o.emit(),
                    (None, None) => GoExpr::ident("<<unimp_arrayref>>"),
                };
                GoExpr::Index {
                    x: Box::new(x),
                    index: Box::new(ai.index.emit()),
                }
            }
            VarKind::Constant(c) => GoExpr::ident(c.borrow().name.clone()),
        }
    }

    /// The bare-identifier form (no receiver selection).
    pub fn ident(&self) -> GoExpr {
        match self {
            VarKind::Attribute { base, .. } => base.borrow().ident(),
            VarKind::Index(ai) => match &ai.base {
                Some(b) => b.borrow().ident(),
                None => GoExpr::ident("<<unimp_arrayref>>"),
            },
            _ => GoExpr::ident(self.go_name()),
        }
    }

    /// The declared Go type, if one is known.
    pub fn type_expr(&self) -> Option<GoExpr> {
        self.var_type().and_then(|td| td.type_expr())
    }
}

/// Structural equality for variable references: same cell, or same
/// `(receiver, name)` pair. Fakes and placeholders only equal themselves.
pub fn var_eq(a: &Var, b: &Var) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }

    let ab = a.borrow();
    let bb = b.borrow();

    if matches!(&*ab, VarKind::Fake { .. } | VarKind::ObjectDotName { .. })
        || matches!(&*bb, VarKind::Fake { .. } | VarKind::ObjectDotName { .. })
    {
        return false;
    }

    let an = ab.name();
    if an.is_empty() {
        return false;
    }

    ab.receiver() == bb.receiver() && an == bb.name()
}

/// Whether the reference `a` mentions the variable `b`, looking through
/// wrapped expressions.
pub fn var_has(a: &Var, b: &Var) -> bool {
    if var_eq(a, b) {
        return true;
    }

    match &*a.borrow() {
        VarKind::ObjectDotName { x, ref_var } => var_eq(ref_var, b) || x.has_variable(b),
        VarKind::Index(ai) => {
            if let Some(base) = &ai.base {
                if var_eq(base, b) {
                    return true;
                }
            }
            if let Some(obj) = &ai.obj {
                if obj.has_variable(b) {
                    return true;
                }
            }
            ai.index.has_variable(b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_var(receiver: &str, name: &str) -> Var {
        new_var(VarKind::Data(VarData {
            receiver: receiver.to_string(),
            name: name.to_string(),
            go_name: name.to_string(),
            var_type: None,
            class_field: !receiver.is_empty(),
            is_static: false,
            is_final: false,
        }))
    }

    #[test]
    fn selector_equals_its_field() {
        let rcvr = data_var("", "rcvr");
        let field = data_var("rcvr", "val");
        let sel = new_var(VarKind::Selector {
            x: rcvr,
            sel: field.clone(),
        });

        assert!(var_eq(&sel, &field));
        assert!(var_eq(&field, &sel));
    }

    #[test]
    fn fakes_only_equal_themselves() {
        let f1 = fake_var("x", 0);
        let f2 = fake_var("x", 0);
        assert!(var_eq(&f1, &f1));
        assert!(!var_eq(&f1, &f2));
    }

    #[test]
    fn field_emits_through_receiver() {
        let field = data_var("rcvr", "val");
        assert_eq!(
            field.borrow().expr(),
            GoExpr::selector(GoExpr::ident("rcvr"), "val")
        );
        assert_eq!(field.borrow().ident(), GoExpr::ident("val"));
    }

    #[test]
    fn attribute_names() {
        let base = data_var("", "args");
        let attr = new_var(VarKind::Attribute {
            base,
            suffix: "length".to_string(),
        });
        assert_eq!(attr.borrow().name(), "args.length");
        assert_eq!(attr.borrow().go_name(), "args.length");
    }
}

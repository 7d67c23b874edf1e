//! Model expressions.

use std::sync::Arc;

use j2go_goast::ast::Expr as GoExpr;
use j2go_goast::ast::Stmt as GoStmt;
use j2go_goast::token::{AssignOp, BinOp, UnOp};

use super::class::ClassRc;
use super::method::MethodRc;
use super::var::{var_eq, var_has, Var, VarInitRc};
use crate::typedata::{self, TypeData};

/// Unary operators, including the increment/decrement pair that only
/// exists in statement position on the Go side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Add,
    Sub,
    Not,
    BitNot,
    Inc,
    Dec,
}

/// `this` / `super` appearing in expression position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    This,
    Super,
}

impl Keyword {
    pub fn name(self) -> &'static str {
        match self {
            Keyword::This => "this",
            Keyword::Super => "super",
        }
    }
}

/// A literal, carried as normalized Go source text.
#[derive(Debug, Clone)]
pub struct Literal {
    pub text: String,
}

impl Literal {
    pub fn new(text: impl Into<String>) -> Literal {
        Literal { text: text.into() }
    }

    pub fn is_string(&self) -> bool {
        self.text.starts_with('"')
    }
}

/// An argument list shared by calls and allocations.
#[derive(Debug, Default)]
pub struct Args {
    pub args: Vec<Expr>,
}

impl Args {
    pub fn new(args: Vec<Expr>) -> Args {
        Args { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The static types of the arguments, for overload resolution.
    pub fn type_vector(&self) -> Vec<Option<Arc<TypeData>>> {
        self.args.iter().map(Expr::var_type).collect()
    }

    pub fn emit_list(&self) -> Vec<GoExpr> {
        self.args.iter().map(Expr::emit).collect()
    }

    pub fn has_variable(&self, var: &Var) -> bool {
        self.args.iter().any(|a| a.has_variable(var))
    }
}

/// An assignment; usable as a statement and (rarely) as an expression.
#[derive(Debug)]
pub struct Assign {
    pub lhs: Var,
    pub op: AssignOp,
    pub rhs: Vec<Expr>,
}

/// What a method call dispatches through.
#[derive(Debug)]
pub enum CallRecv {
    /// A bare or class-qualified call.
    None,
    /// A call through a variable (`list.add(x)`).
    Var(Var),
    /// A call through an arbitrary expression (`f().g()`).
    Expr(Box<Expr>),
}

/// A method invocation.
#[derive(Debug)]
pub struct MethodCall {
    pub recv: CallRecv,
    pub method: MethodRc,
    pub args: Args,
}

/// `new Foo(...)`, lowered to a constructor call.
#[derive(Debug)]
pub struct ClassAlloc {
    pub class: ClassRc,
    pub method: MethodRc,
    pub args: Vec<Expr>,
}

/// A construct with no Go mapping; prints as `<<unimp_ctx[text]>>`.
#[derive(Debug, Clone)]
pub struct Unimplemented {
    pub context: String,
    pub text: String,
}

impl Unimplemented {
    pub fn new(context: &str, text: impl Into<String>) -> Unimplemented {
        Unimplemented {
            context: context.to_string(),
            text: text.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("<<unimp_{}[{}]>>", self.context, self.text)
    }
}

/// A model expression.
#[derive(Debug)]
pub enum Expr {
    /// `make([]T, n)`
    ArrayAlloc { ty: Arc<TypeData>, args: Vec<Expr> },
    /// `[]T{e1, e2, ...}`
    ArrayInit { ty: Arc<TypeData>, elems: Vec<Expr> },
    Assign(Box<Assign>),
    Binary {
        x: Box<Expr>,
        op: BinOp,
        y: Box<Expr>,
        /// Set for Java `>>>`; the left operand is cast to `uint32`.
        unsigned: bool,
    },
    Call(MethodCall),
    /// A Java cast, emitted as a type assertion.
    Cast { target: Box<Expr>, ty: Arc<TypeData> },
    ClassAlloc(ClassAlloc),
    /// `this(...)` / `super(...)`; replaced during constructor fixup.
    CtorCall { is_super: bool, args: Args },
    /// `x instanceof T`: evaluates to `ok`, with the assertion emitted as
    /// an init statement on the enclosing `if`.
    InstanceOf { expr: Box<Expr>, ty_var: Var },
    Keyword(Keyword),
    Literal(Literal),
    /// A package-qualified name introduced by rewrite rules (`os.Stderr`).
    PkgName { pkg: String, name: String },
    /// The receiver allocation `&Class{}` in constructors.
    StructRef { class: String },
    Unary { op: UnaryOp, x: Box<Expr> },
    Unimplemented(Unimplemented),
    Var(Var),
    /// A brace initializer attached to a variable.
    VarInitExpr(VarInitRc),
}

impl Expr {
    pub fn literal(text: impl Into<String>) -> Expr {
        Expr::Literal(Literal::new(text))
    }

    pub fn unimplemented(context: &str, text: impl Into<String>) -> Expr {
        Expr::Unimplemented(Unimplemented::new(context, text))
    }

    /// Emit as a Go expression.
    pub fn emit(&self) -> GoExpr {
        match self {
            Expr::ArrayAlloc { ty, args } => {
                let elt = ty.type_expr().unwrap_or(GoExpr::EmptyInterface);
                let mut call_args = vec![GoExpr::ArrayType { elt: Box::new(elt) }];
                call_args.extend(args.iter().map(Expr::emit));
                GoExpr::call(GoExpr::ident("make"), call_args)
            }
            Expr::ArrayInit { ty, elems } => GoExpr::Composite {
                ty: ty.type_expr().map(Box::new),
                elts: elems.iter().map(Expr::emit).collect(),
            },
            Expr::Assign(_) => GoExpr::ident("<<unimp_assign_expr>>"),
            Expr::Binary { x, op, y, unsigned } => {
                let mut xe = x.emit();
                if *unsigned {
                    tracing::warn!(">>> replacement casting operand to uint32");
                    xe = GoExpr::call(GoExpr::ident("uint32"), vec![xe]);
                }
                GoExpr::Binary {
                    x: Box::new(xe),
                    op: *op,
                    y: Box::new(y.emit()),
                }
            }
            Expr::Call(mc) => mc.emit(),
            Expr::Cast { target, ty } => GoExpr::TypeAssert {
                x: Box::new(target.emit()),
                ty: Box::new(ty.type_expr().unwrap_or(GoExpr::EmptyInterface)),
            },
            Expr::ClassAlloc(alloc) => GoExpr::call(
                GoExpr::Ident(alloc.method.borrow().go_name()),
                alloc.args.iter().map(Expr::emit).collect(),
            ),
            Expr::CtorCall { is_super, args } => {
                let name = if *is_super { "super" } else { "this" };
                GoExpr::call(
                    GoExpr::Ident(format!("<<unimp_ctorcall[{}]>>", name)),
                    args.emit_list(),
                )
            }
            Expr::InstanceOf { .. } => GoExpr::ident("ok"),
            Expr::Keyword(k) => GoExpr::ident(k.name()),
            Expr::Literal(l) => GoExpr::BasicLit(l.text.clone()),
            Expr::PkgName { pkg, name } => {
                GoExpr::selector(GoExpr::ident(pkg.clone()), name.clone())
            }
            Expr::StructRef { class } => GoExpr::Unary {
                op: UnOp::And,
                x: Box::new(GoExpr::Composite {
                    ty: Some(Box::new(GoExpr::ident(class.clone()))),
                    elts: vec![],
                }),
            },
            Expr::Unary { op, x } => match op {
                UnaryOp::Inc | UnaryOp::Dec => GoExpr::ident("<<unimp_incdec_expr>>"),
                UnaryOp::Add => GoExpr::Unary {
                    op: UnOp::Add,
                    x: Box::new(x.emit()),
                },
                UnaryOp::Sub => GoExpr::Unary {
                    op: UnOp::Sub,
                    x: Box::new(x.emit()),
                },
                UnaryOp::Not => GoExpr::Unary {
                    op: UnOp::Not,
                    x: Box::new(x.emit()),
                },
                UnaryOp::BitNot => GoExpr::Unary {
                    op: UnOp::Xor,
                    x: Box::new(x.emit()),
                },
            },
            Expr::Unimplemented(u) => GoExpr::Ident(u.render()),
            Expr::Var(v) => v.borrow().expr(),
            Expr::VarInitExpr(vi) => vi.borrow().emit(),
        }
    }

    /// The preparatory statement some expressions need (`instanceof`
    /// emits its comma-ok assertion here; everything else has none).
    pub fn init_stmt(&self) -> Option<GoStmt> {
        match self {
            Expr::InstanceOf { expr, ty_var } => Some(GoStmt::Assign {
                lhs: vec![GoExpr::ident("_"), GoExpr::ident("ok")],
                op: AssignOp::Define,
                rhs: vec![GoExpr::TypeAssert {
                    x: Box::new(expr.emit()),
                    ty: Box::new(ty_var.borrow().ident()),
                }],
            }),
            _ => None,
        }
    }

    /// The expression's static type, when one is known.
    pub fn var_type(&self) -> Option<Arc<TypeData>> {
        match self {
            Expr::ArrayAlloc { ty, .. } => Some(Arc::new(TypeData::Array {
                elem: Some(ty.clone()),
                dims: 1,
            })),
            Expr::ArrayInit { ty, .. } => Some(ty.clone()),
            Expr::Assign(a) => a.lhs.borrow().var_type(),
            Expr::Binary { x, y, .. } => x.var_type().or_else(|| y.var_type()),
            Expr::Call(mc) => mc.method.borrow().var_type(),
            Expr::Cast { ty, .. } => Some(ty.clone()),
            Expr::ClassAlloc(alloc) => {
                let name = alloc.class.borrow().name();
                Some(Arc::new(TypeData::Class(name)))
            }
            Expr::InstanceOf { .. } => Some(typedata::bool_type()),
            Expr::Literal(l) => {
                if l.is_string() {
                    Some(typedata::string_type())
                } else {
                    None
                }
            }
            Expr::Unary { x, .. } => x.var_type(),
            Expr::Var(v) => v.borrow().var_type(),
            _ => None,
        }
    }

    pub fn has_variable(&self, var: &Var) -> bool {
        match self {
            Expr::ArrayAlloc { args, .. } => args.iter().any(|a| a.has_variable(var)),
            Expr::ArrayInit { elems, .. } => elems.iter().any(|e| e.has_variable(var)),
            Expr::Assign(a) => var_eq(&a.lhs, var) || a.rhs.iter().any(|r| r.has_variable(var)),
            Expr::Binary { x, y, .. } => x.has_variable(var) || y.has_variable(var),
            Expr::Call(mc) => {
                let recv = match &mc.recv {
                    CallRecv::None => false,
                    CallRecv::Var(v) => var_eq(v, var),
                    CallRecv::Expr(e) => e.has_variable(var),
                };
                recv || mc.args.has_variable(var)
            }
            Expr::Cast { target, .. } => target.has_variable(var),
            Expr::ClassAlloc(alloc) => alloc.args.iter().any(|a| a.has_variable(var)),
            Expr::CtorCall { args, .. } => args.has_variable(var),
            Expr::InstanceOf { expr, ty_var } => var_eq(ty_var, var) || expr.has_variable(var),
            Expr::Unary { x, .. } => x.has_variable(var),
            Expr::Var(v) => var_has(v, var),
            Expr::VarInitExpr(vi) => vi.borrow().has_variable(var),
            _ => false,
        }
    }
}

impl MethodCall {
    pub fn emit(&self) -> GoExpr {
        let method = self.method.borrow();
        let fun = match &self.recv {
            CallRecv::None => {
                if let Some(rv) = method.receiver_var() {
                    GoExpr::selector(GoExpr::Ident(rv.borrow().go_name()), method.go_name())
                } else if let Some(qual) = method.qualifier() {
                    GoExpr::selector(GoExpr::Ident(qual), method.go_name())
                } else {
                    GoExpr::Ident(method.go_name())
                }
            }
            CallRecv::Var(v) => GoExpr::selector(v.borrow().expr(), method.go_name()),
            CallRecv::Expr(e) => GoExpr::selector(e.emit(), method.go_name()),
        };

        GoExpr::Call {
            fun: Box::new(fun),
            args: self.args.emit_list(),
        }
    }
}

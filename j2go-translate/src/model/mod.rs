//! The Go-shaped program model built by the lowering engine.
//!
//! Nodes come in capability categories rather than a strict hierarchy:
//! expressions ([`Expr`]), statements ([`Stmt`]), variable references
//! ([`Var`]), methods ([`Method`]), class-like owners ([`Class`]),
//! interfaces, enums and the per-file [`Program`].
//!
//! Every node knows how to *emit* itself as `j2go_goast` syntax and how to
//! be *traversed* post-order by a rewrite rule. Entities that other nodes
//! point at (classes, methods, variables) live behind `Rc<RefCell<_>>`
//! so that a forward reference fulfilled later is seen through every
//! existing handle.

mod class;
mod enums;
mod expr;
mod imports;
mod interfaces;
mod method;
mod program;
mod stmt;
mod var;

pub use class::{
    class_key, finalize_class, new_class, Class, ClassDef, ClassRc, ClassReference, Constant,
    ConstRc, FakeClass,
};
pub use enums::EnumDef;
pub use expr::{
    Args, Assign, CallRecv, ClassAlloc, Expr, Keyword, Literal, MethodCall, UnaryOp, Unimplemented,
};
pub use imports::ImportSet;
pub use interfaces::{new_interface, Interface, InterfaceDef, InterfaceRc, InterfaceRef};
pub use method::{
    fake_method, new_method, ClassMethod, FakeMethod, IfaceMethod, Method, MethodKind, MethodRc,
    MethodReference,
};
pub use program::{Program, DEFAULT_RECEIVER};
pub use stmt::{Block, Stmt, SwitchCase, SwitchLabel, Try, TryCatch};
pub use var::{
    fake_var, new_var, var_eq, var_has, ArrayIndex, Var, VarData, VarInit, VarInitRc, VarKind,
};

//! Model statements.

use j2go_goast::ast::{Block as GoBlock, CaseClause, Decl as GoDecl, Expr as GoExpr, Stmt as GoStmt, ValueSpec};
use j2go_goast::token::{AssignOp, Branch, UnOp};
use tracing::warn;

use super::expr::{Args, Assign, Expr, UnaryOp, Unimplemented};
use super::var::{var_eq, var_has, Var};

/// A braced list of model statements.
#[derive(Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Block {
        Block { stmts }
    }

    /// Emit the statements, flattened (one model statement may expand to
    /// several Go statements).
    pub fn emit_list(&self) -> Vec<GoStmt> {
        let mut list = Vec::new();
        for stmt in &self.stmts {
            list.extend(stmt.emit());
        }
        list
    }

    pub fn emit(&self) -> GoBlock {
        GoBlock::new(self.emit_list())
    }

    pub fn has_variable(&self, var: &Var) -> bool {
        self.stmts.iter().any(|s| s.has_variable(var))
    }
}

/// One `case`/`default` arm of a switch.
#[derive(Debug)]
pub struct SwitchCase {
    pub labels: Vec<SwitchLabel>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub struct SwitchLabel {
    pub is_default: bool,
    pub expr: Option<Expr>,
}

/// `try`/`catch`/`finally`, kept only to emit advisory fake-call chains.
#[derive(Debug)]
pub struct Try {
    pub block: Block,
    pub catches: Vec<TryCatch>,
    pub finally: Option<Block>,
}

#[derive(Debug)]
pub struct TryCatch {
    pub var: Var,
    pub block: Block,
}

/// A model statement.
#[derive(Debug)]
pub enum Stmt {
    Assign(Assign),
    Block(Block),
    Branch {
        tok: Branch,
        label: Option<String>,
    },
    Expr(Expr),
    /// `for (T v : iter)` → `for _, v := range iter`.
    ForColon {
        var: Var,
        expr: Expr,
        body: Block,
    },
    /// Three-clause `for` whose init is a bare expression.
    ForExpr {
        init: Vec<Expr>,
        cond: Option<Expr>,
        incr: Vec<Expr>,
        body: Block,
    },
    /// Three-clause `for` that declares its loop variable.
    ForVar {
        var: Var,
        init: Option<Expr>,
        cond: Option<Expr>,
        incr: Vec<Stmt>,
        body: Block,
    },
    IfElse {
        cond: Expr,
        then: Box<Stmt>,
        els: Option<Box<Stmt>>,
    },
    JumpToLabel {
        label: String,
        is_continue: bool,
    },
    Labeled {
        label: String,
        stmt: Box<Stmt>,
    },
    LocalVarNoInit(Var),
    LocalVarInit {
        var: Var,
        init: Expr,
    },
    /// A local whose initializer was a cast: comma-ok assert plus a panic
    /// check.
    LocalVarCast {
        var: Var,
        cast: Expr,
    },
    /// Constructor receiver setup: `rcvr := &Class{}`, delegation to
    /// `NewClass(...)`, or `rcvr.Super = NewSuper(...)`.
    NewStruct {
        rcvr: Var,
        class: String,
        is_super: bool,
        args: Args,
    },
    Return(Option<Expr>),
    Switch {
        expr: Expr,
        cases: Vec<SwitchCase>,
    },
    Synchronized {
        expr: Expr,
        block: Block,
    },
    Throw(Expr),
    Try(Try),
    Unimplemented(Unimplemented),
    While {
        cond: Expr,
        stmt: Box<Stmt>,
        is_do_while: bool,
    },
    Empty,
}

/// Emit an expression in statement position: assignments become
/// assignment statements and `++`/`--` become inc/dec statements.
fn expr_as_stmt(expr: &Expr) -> GoStmt {
    match expr {
        Expr::Assign(a) => assign_stmt(a),
        Expr::Unary {
            op: UnaryOp::Inc,
            x,
        } => GoStmt::IncDec {
            x: x.emit(),
            dec: false,
        },
        Expr::Unary {
            op: UnaryOp::Dec,
            x,
        } => GoStmt::IncDec {
            x: x.emit(),
            dec: true,
        },
        other => GoStmt::Expr(other.emit()),
    }
}

fn assign_stmt(a: &Assign) -> GoStmt {
    GoStmt::Assign {
        lhs: vec![a.lhs.borrow().expr()],
        op: a.op,
        rhs: a.rhs.iter().map(Expr::emit).collect(),
    }
}

/// Collapse an emitted statement list into a single Go block.
fn block_of(mut stmts: Vec<GoStmt>) -> GoBlock {
    if stmts.len() == 1 {
        if let GoStmt::Block(_) = &stmts[0] {
            if let GoStmt::Block(b) = stmts.pop().unwrap() {
                return b;
            }
        }
    }
    GoBlock::new(stmts)
}

fn single_stmt(mut stmts: Vec<GoStmt>) -> GoStmt {
    if stmts.len() == 1 {
        return stmts.pop().unwrap();
    }
    GoStmt::Block(GoBlock::new(stmts))
}

impl Stmt {
    pub fn emit(&self) -> Vec<GoStmt> {
        match self {
            Stmt::Assign(a) => vec![assign_stmt(a)],
            Stmt::Block(b) => vec![GoStmt::Block(b.emit())],
            Stmt::Branch { tok, label } => vec![GoStmt::Branch {
                tok: *tok,
                label: label.clone(),
            }],
            Stmt::Expr(e) => vec![expr_as_stmt(e)],
            Stmt::ForColon { var, expr, body } => vec![GoStmt::Range {
                key: "_".to_string(),
                value: var.borrow().go_name(),
                x: expr.emit(),
                body: body.emit(),
            }],
            Stmt::ForExpr {
                init,
                cond,
                incr,
                body,
            } => {
                if init.len() > 1 {
                    warn!("ignoring extra for-init expressions ({})", init.len());
                }
                if incr.len() > 1 {
                    warn!("ignoring extra for-update expressions ({})", incr.len());
                }
                vec![GoStmt::For {
                    init: init.first().map(|e| Box::new(expr_as_stmt(e))),
                    cond: cond.as_ref().map(Expr::emit),
                    post: incr.first().map(|e| Box::new(expr_as_stmt(e))),
                    body: body.emit(),
                }]
            }
            Stmt::ForVar {
                var,
                init,
                cond,
                incr,
                body,
            } => {
                let init_stmt = match init {
                    Some(e) => Some(Box::new(GoStmt::Assign {
                        lhs: vec![GoExpr::Ident(var.borrow().go_name())],
                        op: AssignOp::Define,
                        rhs: vec![e.emit()],
                    })),
                    None => {
                        warn!("for-loop variable {} has no initializer", var.borrow().name());
                        None
                    }
                };

                if incr.len() > 1 {
                    warn!("ignoring extra for-update statements ({})", incr.len());
                }
                let post = incr.first().map(|s| Box::new(single_stmt(s.emit())));

                vec![GoStmt::For {
                    init: init_stmt,
                    cond: cond.as_ref().map(Expr::emit),
                    post,
                    body: body.emit(),
                }]
            }
            Stmt::IfElse { cond, then, els } => {
                let init = cond.init_stmt().map(Box::new);
                let body = block_of(then.emit());
                let els = els.as_ref().map(|e| Box::new(single_stmt(e.emit())));
                vec![GoStmt::If {
                    init,
                    cond: cond.emit(),
                    body,
                    els,
                }]
            }
            Stmt::JumpToLabel { label, is_continue } => vec![GoStmt::Branch {
                tok: if *is_continue {
                    Branch::Continue
                } else {
                    Branch::Break
                },
                label: Some(label.clone()),
            }],
            Stmt::Labeled { label, stmt } => vec![GoStmt::Labeled {
                label: label.clone(),
                stmt: Box::new(single_stmt(stmt.emit())),
            }],
            Stmt::LocalVarNoInit(var) => {
                let vb = var.borrow();
                vec![GoStmt::Decl(GoDecl::Var {
                    specs: vec![ValueSpec {
                        names: vec![vb.go_name()],
                        ty: Some(vb.type_expr().unwrap_or(GoExpr::EmptyInterface)),
                        values: vec![],
                    }],
                })]
            }
            Stmt::LocalVarInit { var, init } => vec![GoStmt::Assign {
                lhs: vec![GoExpr::Ident(var.borrow().go_name())],
                op: AssignOp::Define,
                rhs: vec![init.emit()],
            }],
            Stmt::LocalVarCast { var, cast } => {
                let type_desc = cast
                    .var_type()
                    .map(|td| td.render())
                    .unwrap_or_else(|| "?".to_string());

                let assert = GoStmt::Assign {
                    lhs: vec![GoExpr::Ident(var.borrow().go_name()), GoExpr::ident("ok")],
                    op: AssignOp::Define,
                    rhs: vec![cast.emit()],
                };

                let check = GoStmt::If {
                    init: None,
                    cond: GoExpr::Unary {
                        op: UnOp::Not,
                        x: Box::new(GoExpr::ident("ok")),
                    },
                    body: GoBlock::new(vec![GoStmt::Expr(GoExpr::call(
                        GoExpr::ident("panic"),
                        vec![GoExpr::BasicLit(format!(
                            "\"cast failed for {}\"",
                            type_desc
                        ))],
                    ))]),
                    els: None,
                };

                vec![assert, check]
            }
            Stmt::NewStruct {
                rcvr,
                class,
                is_super,
                args,
            } => {
                let call = GoExpr::call(GoExpr::Ident(format!("New{}", class)), args.emit_list());
                if *is_super {
                    vec![GoStmt::Assign {
                        lhs: vec![GoExpr::selector(rcvr.borrow().ident(), class.clone())],
                        op: AssignOp::Assign,
                        rhs: vec![call],
                    }]
                } else {
                    vec![GoStmt::Assign {
                        lhs: vec![rcvr.borrow().ident()],
                        op: AssignOp::Define,
                        rhs: vec![call],
                    }]
                }
            }
            Stmt::Return(expr) => vec![GoStmt::Return(
                expr.iter().map(Expr::emit).collect(),
            )],
            Stmt::Switch { expr, cases } => vec![emit_switch(expr, cases)],
            Stmt::Synchronized { expr, block } => vec![GoStmt::If {
                init: None,
                cond: GoExpr::call(GoExpr::ident("synchronized"), vec![expr.emit()]),
                body: block.emit(),
                els: None,
            }],
            Stmt::Throw(expr) => vec![GoStmt::Expr(GoExpr::call(
                GoExpr::ident("throw"),
                vec![expr.emit()],
            ))],
            Stmt::Try(t) => vec![emit_try(t)],
            Stmt::Unimplemented(u) => vec![GoStmt::Expr(GoExpr::Ident(u.render()))],
            Stmt::While {
                cond,
                stmt,
                is_do_while,
            } => {
                let mut body = block_of(stmt.emit());
                if *is_do_while {
                    // check the condition at the bottom of the loop
                    body.stmts.push(GoStmt::If {
                        init: None,
                        cond: GoExpr::Unary {
                            op: UnOp::Not,
                            x: Box::new(GoExpr::Paren(Box::new(cond.emit()))),
                        },
                        body: GoBlock::new(vec![GoStmt::Branch {
                            tok: Branch::Break,
                            label: None,
                        }]),
                        els: None,
                    });
                    vec![GoStmt::For {
                        init: None,
                        cond: None,
                        post: None,
                        body,
                    }]
                } else {
                    vec![GoStmt::For {
                        init: None,
                        cond: Some(cond.emit()),
                        post: None,
                        body,
                    }]
                }
            }
            Stmt::Empty => vec![],
        }
    }

    pub fn has_variable(&self, var: &Var) -> bool {
        match self {
            Stmt::Assign(a) => {
                var_eq(&a.lhs, var) || a.rhs.iter().any(|r| r.has_variable(var))
            }
            Stmt::Block(b) => b.has_variable(var),
            Stmt::Expr(e) => e.has_variable(var),
            Stmt::ForColon {
                var: v,
                expr,
                body,
            } => var_eq(v, var) || expr.has_variable(var) || body.has_variable(var),
            Stmt::ForExpr {
                init,
                cond,
                incr,
                body,
            } => {
                init.iter().any(|e| e.has_variable(var))
                    || cond.as_ref().is_some_and(|c| c.has_variable(var))
                    || incr.iter().any(|e| e.has_variable(var))
                    || body.has_variable(var)
            }
            Stmt::ForVar {
                var: v,
                init,
                cond,
                incr,
                body,
            } => {
                var_eq(v, var)
                    || init.as_ref().is_some_and(|e| e.has_variable(var))
                    || cond.as_ref().is_some_and(|c| c.has_variable(var))
                    || incr.iter().any(|s| s.has_variable(var))
                    || body.has_variable(var)
            }
            Stmt::IfElse { cond, then, els } => {
                cond.has_variable(var)
                    || then.has_variable(var)
                    || els.as_ref().is_some_and(|e| e.has_variable(var))
            }
            Stmt::Labeled { stmt, .. } => stmt.has_variable(var),
            Stmt::LocalVarNoInit(v) => var_eq(v, var),
            Stmt::LocalVarInit { var: v, init } => var_eq(v, var) || init.has_variable(var),
            Stmt::LocalVarCast { var: v, cast } => var_eq(v, var) || cast.has_variable(var),
            Stmt::NewStruct { args, .. } => args.has_variable(var),
            Stmt::Return(e) => e.as_ref().is_some_and(|e| e.has_variable(var)),
            Stmt::Switch { expr, cases } => {
                expr.has_variable(var)
                    || cases.iter().any(|c| {
                        c.labels
                            .iter()
                            .any(|l| l.expr.as_ref().is_some_and(|e| e.has_variable(var)))
                            || c.stmts.iter().any(|s| s.has_variable(var))
                    })
            }
            Stmt::Synchronized { expr, block } => {
                expr.has_variable(var) || block.has_variable(var)
            }
            Stmt::Throw(e) => e.has_variable(var),
            Stmt::Try(t) => {
                t.block.has_variable(var)
                    || t.catches
                        .iter()
                        .any(|c| var_has(&c.var, var) || c.block.has_variable(var))
                    || t.finally.as_ref().is_some_and(|f| f.has_variable(var))
            }
            Stmt::While { cond, stmt, .. } => cond.has_variable(var) || stmt.has_variable(var),
            _ => false,
        }
    }
}

fn emit_switch(expr: &Expr, cases: &[SwitchCase]) -> GoStmt {
    let mut clauses = Vec::new();

    for case in cases {
        // all labels but the last become empty fallthrough cases
        if case.labels.len() > 1 {
            for label in &case.labels[..case.labels.len() - 1] {
                clauses.push(CaseClause {
                    exprs: label_exprs(label),
                    body: vec![GoStmt::Branch {
                        tok: Branch::Fallthrough,
                        label: None,
                    }],
                });
            }
        }

        let mut body = Vec::new();
        for stmt in &case.stmts {
            body.extend(stmt.emit());
        }

        if let Some(last) = case.labels.last() {
            clauses.push(CaseClause {
                exprs: label_exprs(last),
                body,
            });
        }
    }

    GoStmt::Switch {
        tag: expr.emit(),
        cases: clauses,
    }
}

fn label_exprs(label: &SwitchLabel) -> Vec<GoExpr> {
    if label.is_default {
        return vec![];
    }
    label.expr.iter().map(Expr::emit).collect()
}

fn emit_try(t: &Try) -> GoStmt {
    let mut els: Option<Box<GoStmt>> = None;

    if let Some(finally) = &t.finally {
        els = Some(Box::new(GoStmt::If {
            init: None,
            cond: GoExpr::call(GoExpr::ident("finally"), vec![]),
            body: finally.emit(),
            els: None,
        }));
    }

    for catch in t.catches.iter().rev() {
        let vb = catch.var.borrow();
        let exc_name = vb
            .var_type()
            .map(|td| td.name())
            .unwrap_or_else(|| "Exception".to_string());
        els = Some(Box::new(GoStmt::If {
            init: None,
            cond: GoExpr::call(
                GoExpr::Ident(format!("catch_{}", exc_name)),
                vec![GoExpr::Ident(vb.go_name())],
            ),
            body: catch.block.emit(),
            els,
        }));
    }

    GoStmt::If {
        init: None,
        cond: GoExpr::call(GoExpr::ident("try"), vec![]),
        body: t.block.emit(),
        els,
    }
}

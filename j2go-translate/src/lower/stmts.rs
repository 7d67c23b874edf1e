//! Lowering of statements.

use tree_sitter::Node;

use super::{decls, exprs, Lowerer};
use crate::model::{
    Block, Class, ClassRc, Expr, Stmt, SwitchCase, SwitchLabel, Try, TryCatch, Unimplemented,
};
use crate::name::TypeName;
use crate::scope::Scope;
use crate::Result;
use crate::TranslateError;
use j2go_goast::token::Branch;

/// Lower a `block` node into a model block, with its own scope.
pub(crate) fn lower_block(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Block> {
    let inner = scope.child();
    let mut stmts = Vec::new();

    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        stmts.extend(lower_stmt(lo, &inner, owner, child)?);
    }

    Ok(Block::new(stmts))
}

/// Lower a statement node; one Java statement may yield several model
/// statements (e.g. a multi-declarator local declaration).
pub(crate) fn lower_stmt(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Vec<Stmt>> {
    let stmt = match node.kind() {
        "block" => Stmt::Block(lower_block(lo, scope, owner, node)?),
        "local_variable_declaration" => return lower_local_var_decl(lo, scope, owner, node),
        "expression_statement" => match node.named_child(0) {
            Some(inner) => lower_expression_statement(lo, scope, owner, inner)?,
            None => return Ok(vec![]),
        },
        "explicit_constructor_invocation" => {
            Stmt::Expr(decls::lower_ctor_invocation(lo, scope, owner, node)?)
        }
        "if_statement" => lower_if(lo, scope, owner, node)?,
        "while_statement" => {
            let cond = lower_condition(lo, scope, owner, node)?;
            let body = match node.child_by_field_name("body") {
                Some(b) => single(lower_stmt(lo, scope, owner, b)?),
                None => Stmt::Empty,
            };
            Stmt::While {
                cond,
                stmt: Box::new(body),
                is_do_while: false,
            }
        }
        "do_statement" => {
            let cond = lower_condition(lo, scope, owner, node)?;
            let body = match node.child_by_field_name("body") {
                Some(b) => single(lower_stmt(lo, scope, owner, b)?),
                None => Stmt::Empty,
            };
            Stmt::While {
                cond,
                stmt: Box::new(body),
                is_do_while: true,
            }
        }
        "for_statement" => lower_for(lo, scope, owner, node)?,
        "enhanced_for_statement" => lower_for_colon(lo, scope, owner, node)?,
        "switch_expression" | "switch_statement" => {
            match lower_switch(lo, scope, owner, node)? {
                Some(s) => s,
                None => return Ok(vec![]),
            }
        }
        "labeled_statement" => {
            let label = node
                .named_children(&mut node.walk())
                .find(|n| n.kind() == "identifier")
                .map(|n| lo.text(n).to_string())
                .unwrap_or_default();
            let inner = node
                .named_children(&mut node.walk())
                .find(|n| n.kind() != "identifier");
            let stmts = match inner {
                Some(s) => lower_stmt(lo, scope, owner, s)?,
                None => vec![],
            };
            if stmts.len() != 1 {
                return Err(TranslateError::invariant(
                    "label assigned to multiple statements",
                ));
            }
            Stmt::Labeled {
                label,
                stmt: Box::new(stmts.into_iter().next().unwrap()),
            }
        }
        "break_statement" | "continue_statement" => {
            let is_continue = node.kind() == "continue_statement";
            let label = node
                .named_children(&mut node.walk())
                .find(|n| n.kind() == "identifier")
                .map(|n| lo.text(n).to_string());
            match label {
                Some(label) => Stmt::JumpToLabel { label, is_continue },
                None => Stmt::Branch {
                    tok: if is_continue {
                        Branch::Continue
                    } else {
                        Branch::Break
                    },
                    label: None,
                },
            }
        }
        "return_statement" => {
            let expr = match node.named_child(0) {
                Some(e) => Some(exprs::lower_expr(lo, scope, owner, e)?),
                None => None,
            };
            Stmt::Return(expr)
        }
        "throw_statement" => {
            let expr = match node.named_child(0) {
                Some(e) => exprs::lower_expr(lo, scope, owner, e)?,
                None => Expr::unimplemented("throw", "empty"),
            };
            Stmt::Throw(expr)
        }
        "try_statement" => lower_try(lo, scope, owner, node)?,
        "try_with_resources_statement" => {
            tracing::warn!("Not lowering try-with-resources");
            Stmt::Unimplemented(Unimplemented::new("stmt", "try_with_resources"))
        }
        "synchronized_statement" => {
            let expr = match node
                .named_children(&mut node.walk())
                .find(|n| n.kind() == "parenthesized_expression")
            {
                Some(e) => exprs::lower_expr(lo, scope, owner, e)?,
                None => Expr::unimplemented("sync", "expr"),
            };
            let block = match node.child_by_field_name("body") {
                Some(b) => lower_block(lo, scope, owner, b)?,
                None => Block::default(),
            };
            Stmt::Synchronized { expr, block }
        }
        "class_declaration" => {
            decls::lower_class_decl(lo, scope, Some(owner), node)?;
            return Ok(vec![]);
        }
        "enum_declaration" => {
            decls::lower_enum_decl(lo, node);
            return Ok(vec![]);
        }
        "method_declaration" => {
            // local method declarations attach to the enclosing class
            if matches!(&*owner.borrow(), Class::Def(_)) {
                let m = decls::lower_method(lo, scope, owner, node)?;
                owner.borrow_mut().add_method(m);
            } else {
                tracing::warn!("Cannot add local method to {:?}", owner.borrow().name());
            }
            return Ok(vec![]);
        }
        ";" | "line_comment" | "block_comment" => return Ok(vec![]),
        other => {
            tracing::warn!("Not lowering statement {}", other);
            Stmt::Unimplemented(Unimplemented::new("stmt", other))
        }
    };

    Ok(vec![stmt])
}

fn single(mut stmts: Vec<Stmt>) -> Stmt {
    match stmts.len() {
        0 => Stmt::Empty,
        1 => stmts.pop().unwrap(),
        _ => Stmt::Block(Block::new(stmts)),
    }
}

/// Lower a loop/if body into a model block.
fn stmt_block(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Block> {
    match single(lower_stmt(lo, scope, owner, node)?) {
        Stmt::Block(b) => Ok(b),
        Stmt::Empty => Ok(Block::default()),
        other => Ok(Block::new(vec![other])),
    }
}

fn lower_condition(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Expr> {
    match node.child_by_field_name("condition") {
        Some(c) => exprs::lower_expr(lo, scope, owner, c),
        None => Ok(Expr::literal("true")),
    }
}

fn lower_expression_statement(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    inner: Node,
) -> Result<Stmt> {
    match inner.kind() {
        "assignment_expression" => Ok(Stmt::Assign(exprs::lower_assignment(
            lo, scope, owner, inner,
        )?)),
        "method_invocation"
        | "object_creation_expression"
        | "update_expression"
        | "unary_expression" => Ok(Stmt::Expr(exprs::lower_expr(lo, scope, owner, inner)?)),
        other => {
            tracing::warn!("Not lowering expression statement {}", other);
            Ok(Stmt::Unimplemented(Unimplemented::new("simpstmt", other)))
        }
    }
}

fn lower_if(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Stmt> {
    let cond = lower_condition(lo, scope, owner, node)?;

    let then = match node.child_by_field_name("consequence") {
        Some(c) => single(lower_stmt(lo, scope, owner, c)?),
        None => return Err(TranslateError::invariant("if statement without a body")),
    };

    let els = match node.child_by_field_name("alternative") {
        Some(a) => Some(Box::new(single(lower_stmt(lo, scope, owner, a)?))),
        None => None,
    };

    Ok(Stmt::IfElse {
        cond,
        then: Box::new(then),
        els,
    })
}

fn lower_for(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Stmt> {
    let inner = scope.child();

    let mut cursor = node.walk();
    let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
    let mut cursor = node.walk();
    let updates: Vec<Node> = node.children_by_field_name("update", &mut cursor).collect();

    let cond = match node.child_by_field_name("condition") {
        Some(c) => Some(exprs::lower_expr(lo, &inner, owner, c)?),
        None => None,
    };

    let body = match node.child_by_field_name("body") {
        Some(b) => stmt_block(lo, &inner, owner, b)?,
        None => {
            tracing::warn!("adding empty for-loop body");
            Block::default()
        }
    };

    // a declared loop variable gets the ForVar shape; expression inits
    // keep the ForExpr shape
    if inits.len() == 1 && inits[0].kind() == "local_variable_declaration" {
        let decl = inits[0];
        let mods = decls::modifiers(lo, decl);
        let (tname, tdims) = match decl.child_by_field_name("type") {
            Some(t) => lo.type_info(t),
            None => (TypeName::new("Object"), 0),
        };

        let mut cursor = decl.walk();
        let declarators: Vec<Node> =
            decl.children_by_field_name("declarator", &mut cursor).collect();
        if declarators.len() > 1 {
            tracing::warn!("ignoring extra for-loop declarators ({})", declarators.len());
        }

        let first = declarators
            .first()
            .ok_or_else(|| TranslateError::invariant("for-loop declaration without declarator"))?;
        let name = first
            .child_by_field_name("name")
            .map(|n| lo.text(n).to_string())
            .unwrap_or_default();

        let td = lo.create_type_data(&tname, tdims)?;
        let var = inner.add_variable(&name, &mods, Some(td), false, "");

        let init = match first.child_by_field_name("value") {
            Some(v) => Some(exprs::lower_expr(lo, &inner, owner, v)?),
            None => None,
        };

        let mut incr = Vec::new();
        for u in updates {
            incr.push(Stmt::Expr(exprs::lower_expr(lo, &inner, owner, u)?));
        }

        return Ok(Stmt::ForVar {
            var,
            init,
            cond,
            incr,
            body,
        });
    }

    let mut init_exprs = Vec::new();
    for i in inits {
        init_exprs.push(exprs::lower_expr(lo, &inner, owner, i)?);
    }
    let mut incr = Vec::new();
    for u in updates {
        incr.push(exprs::lower_expr(lo, &inner, owner, u)?);
    }

    Ok(Stmt::ForExpr {
        init: init_exprs,
        cond,
        incr,
        body,
    })
}

fn lower_for_colon(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Stmt> {
    let inner = scope.child();

    let mods = decls::modifiers(lo, node);
    let (tname, tdims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => (TypeName::new("Object"), 0),
    };
    let name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();

    let td = lo.create_type_data(&tname, tdims)?;
    let var = inner.add_variable(&name, &mods, Some(td), false, "");

    let expr = match node.child_by_field_name("value") {
        Some(v) => exprs::lower_expr(lo, &inner, owner, v)?,
        None => Expr::unimplemented("forcolon", "value"),
    };

    let body = match node.child_by_field_name("body") {
        Some(b) => stmt_block(lo, &inner, owner, b)?,
        None => {
            tracing::warn!("adding empty for-colon body");
            Block::default()
        }
    };

    Ok(Stmt::ForColon { var, expr, body })
}

fn lower_local_var_decl(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Vec<Stmt>> {
    let mods = decls::modifiers(lo, node);
    let (tname, tdims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => return Ok(vec![]),
    };

    let mut stmts = Vec::new();

    let mut cursor = node.walk();
    let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();

    for decl in declarators {
        let name = match decl.child_by_field_name("name") {
            Some(n) => lo.text(n).to_string(),
            None => continue,
        };

        let extra = decl
            .named_children(&mut decl.walk())
            .filter(|n| n.kind() == "dimensions")
            .map(|n| lo.text(n).matches('[').count())
            .sum::<usize>();

        let td = lo.create_type_data(&tname, tdims + extra)?;
        let var = scope.add_variable(&name, &mods, Some(td), false, "");

        let stmt = match decl.child_by_field_name("value") {
            None => Stmt::LocalVarNoInit(var),
            Some(value) if value.kind() == "array_initializer" => {
                let vi = exprs::lower_var_init(lo, scope, owner, value, Some(var.clone()))?;
                Stmt::LocalVarInit {
                    var,
                    init: Expr::VarInitExpr(vi),
                }
            }
            Some(value) if value.kind() == "cast_expression" => Stmt::LocalVarCast {
                var,
                cast: exprs::lower_expr(lo, scope, owner, value)?,
            },
            Some(value) => Stmt::LocalVarInit {
                var,
                init: exprs::lower_expr(lo, scope, owner, value)?,
            },
        };

        stmts.push(stmt);
    }

    Ok(stmts)
}

fn lower_switch(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Option<Stmt>> {
    let expr = lower_condition(lo, scope, owner, node)?;

    let mut cases = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        let groups: Vec<Node> = body.named_children(&mut cursor).collect();

        for group in groups {
            match group.kind() {
                "switch_block_statement_group" => {
                    cases.push(lower_switch_group(lo, scope, owner, group)?);
                }
                "switch_rule" => {
                    tracing::warn!("Not lowering arrow-form switch rule");
                    cases.push(SwitchCase {
                        labels: vec![SwitchLabel {
                            is_default: true,
                            expr: None,
                        }],
                        stmts: vec![Stmt::Unimplemented(Unimplemented::new(
                            "switch",
                            "switch_rule",
                        ))],
                    });
                }
                _ => {}
            }
        }
    }

    // empty switch statements are dropped entirely
    if cases.is_empty() {
        return Ok(None);
    }

    Ok(Some(Stmt::Switch { expr, cases }))
}

fn lower_switch_group(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    group: Node,
) -> Result<SwitchCase> {
    let inner = scope.child();

    let mut labels = Vec::new();
    let mut stmts = Vec::new();

    let mut cursor = group.walk();
    let children: Vec<Node> = group.named_children(&mut cursor).collect();
    for child in children {
        if child.kind() == "switch_label" {
            labels.push(lower_switch_label(lo, &inner, owner, child)?);
        } else {
            stmts.extend(lower_stmt(lo, &inner, owner, child)?);
        }
    }

    if labels.is_empty() {
        return Err(TranslateError::invariant("switch case without labels"));
    }

    // Go cases do not fall through: strip an explicit trailing break,
    // otherwise add an explicit fallthrough
    let mut need_fall = true;
    match stmts.last() {
        Some(Stmt::Branch {
            tok: Branch::Break,
            label: None,
        }) => {
            stmts.pop();
            need_fall = false;
        }
        Some(Stmt::Branch {
            tok: Branch::Continue,
            ..
        })
        | Some(Stmt::JumpToLabel { .. }) => {
            need_fall = false;
        }
        _ => {}
    }

    if need_fall {
        stmts.push(Stmt::Branch {
            tok: Branch::Fallthrough,
            label: None,
        });
    }

    Ok(SwitchCase { labels, stmts })
}

fn lower_switch_label(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<SwitchLabel> {
    if lo.text(node).trim_start().starts_with("default") {
        return Ok(SwitchLabel {
            is_default: true,
            expr: None,
        });
    }

    let expr = match node.named_child(0) {
        Some(e) => Some(exprs::lower_expr(lo, scope, owner, e)?),
        None => return Err(TranslateError::invariant("empty switch label")),
    };

    Ok(SwitchLabel {
        is_default: false,
        expr,
    })
}

fn lower_try(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Stmt> {
    let block = match node.child_by_field_name("body") {
        Some(b) => {
            let s = scope.child();
            lower_block(lo, &s, owner, b)?
        }
        None => Block::default(),
    };

    let mut catches = Vec::new();
    let mut finally = None;

    let catch_scope = scope.child();
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "catch_clause" => {
                let param = child
                    .named_children(&mut child.walk())
                    .find(|n| n.kind() == "catch_formal_parameter");

                let var = match param {
                    Some(p) => lower_catch_parameter(lo, &catch_scope, p)?,
                    None => crate::model::fake_var("<<catch>>", 0),
                };

                let body = match child.child_by_field_name("body") {
                    Some(b) => lower_block(lo, &catch_scope, owner, b)?,
                    None => Block::default(),
                };

                catches.push(TryCatch { var, block: body });
            }
            "finally_clause" => {
                if let Some(b) = child
                    .named_children(&mut child.walk())
                    .find(|n| n.kind() == "block")
                {
                    let s = scope.child();
                    finally = Some(lower_block(lo, &s, owner, b)?);
                }
            }
            _ => {}
        }
    }

    Ok(Stmt::Try(Try {
        block,
        catches,
        finally,
    }))
}

fn lower_catch_parameter(
    lo: &mut Lowerer,
    scope: &Scope,
    node: Node,
) -> Result<crate::model::Var> {
    let mods = decls::modifiers(lo, node);

    let catch_type = node
        .named_children(&mut node.walk())
        .find(|n| n.kind() == "catch_type");

    let types: Vec<Node> = match catch_type {
        Some(ct) => ct.named_children(&mut ct.walk()).collect(),
        None => vec![],
    };

    if types.len() > 1 {
        tracing::warn!("Ignoring multi-type catch (keeping first of {})", types.len());
    }

    let td = match types.first() {
        Some(t) => {
            let (tname, dims) = lo.type_info(*t);
            lo.create_type_data(&tname, dims)?
        }
        None => lo.create_type_data(&TypeName::new("Exception"), 0)?,
    };

    let name = node
        .child_by_field_name("name")
        .or_else(|| {
            node.named_children(&mut node.walk())
                .find(|n| n.kind() == "identifier")
        })
        .map(|n| lo.text(n).to_string())
        .unwrap_or_else(|| "e".to_string());

    Ok(scope.add_variable(&name, &mods, Some(td), false, ""))
}

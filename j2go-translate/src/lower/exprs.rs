//! Lowering of expressions.

use std::cell::RefCell;
use std::rc::Rc;

use tree_sitter::Node;

use super::Lowerer;
use crate::model::{
    fake_var, new_class, new_method, new_var, Args, ArrayIndex, Assign, CallRecv, Class,
    ClassAlloc, ClassDef, ClassRc, Expr, FakeClass, Keyword, Method, MethodRc, MethodReference,
    UnaryOp, Var, VarInit, VarInitRc, VarKind,
};
use crate::name::TypeName;
use crate::scope::Scope;
use crate::{Result, TranslateError};
use j2go_goast::token::{AssignOp, BinOp};

pub(crate) fn lower_expr(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Expr> {
    match node.kind() {
        "parenthesized_expression" | "condition" => match node.named_child(0) {
            Some(inner) => lower_expr(lo, scope, owner, inner),
            None => Ok(Expr::unimplemented("expr", "empty_parens")),
        },
        "assignment_expression" => Ok(Expr::Assign(Box::new(lower_assignment(
            lo, scope, owner, node,
        )?))),
        "binary_expression" => lower_binary(lo, scope, owner, node),
        "unary_expression" => lower_unary(lo, scope, owner, node),
        "update_expression" => lower_update(lo, scope, owner, node),
        "cast_expression" => {
            let ty = match node.child_by_field_name("type") {
                Some(t) => {
                    let (tname, dims) = lo.type_info(t);
                    lo.create_type_data(&tname, dims)?
                }
                None => return Err(TranslateError::invariant("cast without a type")),
            };
            let target = match node.child_by_field_name("value") {
                Some(v) => lower_expr(lo, scope, owner, v)?,
                None => return Err(TranslateError::invariant("cast without a value")),
            };
            Ok(Expr::Cast {
                target: Box::new(target),
                ty,
            })
        }
        "instanceof_expression" => {
            let expr = match node.child_by_field_name("left") {
                Some(l) => lower_expr(lo, scope, owner, l)?,
                None => return Err(TranslateError::invariant("instanceof without operand")),
            };
            let ty_var = match node.child_by_field_name("right") {
                Some(r) => {
                    let (tname, dims) = lo.type_info(r);
                    match scope.find_variable(&tname) {
                        Some(v) => v,
                        None => fake_var(&tname.to_string(), dims),
                    }
                }
                None => fake_var("<<instanceof>>", 0),
            };
            Ok(Expr::InstanceOf {
                expr: Box::new(expr),
                ty_var,
            })
        }
        "method_invocation" => lower_method_invocation(lo, scope, owner, node),
        "object_creation_expression" => lower_alloc(lo, scope, owner, node),
        "array_creation_expression" => lower_array_alloc(lo, scope, owner, node),
        "array_initializer" => {
            let vi = lower_var_init(lo, scope, owner, node, None)?;
            Ok(Expr::VarInitExpr(vi))
        }
        "array_access" => Ok(Expr::Var(lower_array_access(lo, scope, owner, node)?)),
        "field_access" => lower_field_access(lo, scope, owner, node),
        "identifier" => Ok(Expr::Var(find_or_fake(lo, scope, node))),
        "this" => Ok(Expr::Keyword(Keyword::This)),
        "super" => Ok(Expr::Keyword(Keyword::Super)),
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal" => {
            let text = lo.text(node).trim_end_matches(['l', 'L']).to_string();
            Ok(Expr::literal(text))
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            let text = lo
                .text(node)
                .trim_end_matches(['f', 'F', 'd', 'D'])
                .to_string();
            Ok(Expr::literal(text))
        }
        "true" | "false" | "character_literal" | "string_literal" => {
            Ok(Expr::literal(lo.text(node)))
        }
        "null_literal" => Ok(Expr::literal("nil")),
        "ternary_expression" => {
            tracing::warn!("Not converting conditional expression");
            Ok(Expr::unimplemented("expr", "conditional"))
        }
        "lambda_expression" | "method_reference" | "class_literal" | "switch_expression" => {
            tracing::warn!("Not converting {}", node.kind());
            Ok(Expr::unimplemented("expr", node.kind()))
        }
        other => {
            tracing::warn!("Not lowering expression {}", other);
            Ok(Expr::unimplemented("expr", other))
        }
    }
}

pub(crate) fn lower_arguments(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Args> {
    let mut args = Vec::new();
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        args.push(lower_expr(lo, scope, owner, child)?);
    }
    Ok(Args::new(args))
}

pub(crate) fn lower_assignment(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Assign> {
    let op_text = node
        .child_by_field_name("operator")
        .map(|o| lo.text(o).to_string())
        .unwrap_or_else(|| "=".to_string());

    let op = match op_text.as_str() {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Quo,
        "%=" => AssignOp::Rem,
        "&=" => AssignOp::And,
        "|=" => AssignOp::Or,
        "^=" => AssignOp::Xor,
        "<<=" => AssignOp::Shl,
        ">>=" => AssignOp::Shr,
        ">>>=" => {
            tracing::warn!("Translating >>>= to >>=");
            AssignOp::Shr
        }
        other => {
            return Err(TranslateError::invariant(format!(
                "Unknown assignment operator '{}'",
                other
            )))
        }
    };

    let lhs = match node.child_by_field_name("left") {
        Some(l) => lower_lvalue(lo, scope, owner, l)?,
        None => return Err(TranslateError::invariant("assignment without left side")),
    };

    let rhs = match node.child_by_field_name("right") {
        Some(r) => lower_expr(lo, scope, owner, r)?,
        None => return Err(TranslateError::invariant("assignment without right side")),
    };

    Ok(Assign {
        lhs,
        op,
        rhs: vec![rhs],
    })
}

fn lower_lvalue(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Var> {
    match node.kind() {
        "identifier" => Ok(find_or_fake(lo, scope, node)),
        "array_access" => lower_array_access(lo, scope, owner, node),
        "field_access" => match lower_field_access(lo, scope, owner, node)? {
            Expr::Var(v) => Ok(v),
            other => {
                tracing::warn!("Faking assignment target");
                let _ = other;
                Ok(fake_var("<<lvalue>>", 0))
            }
        },
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => lower_lvalue(lo, scope, owner, inner),
            None => Ok(fake_var("<<lvalue>>", 0)),
        },
        other => Err(TranslateError::invariant(format!(
            "Unknown assignment target {}",
            other
        ))),
    }
}

fn lower_binary(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Expr> {
    let op_text = node
        .child_by_field_name("operator")
        .map(|o| lo.text(o).to_string())
        .unwrap_or_default();

    let (op, unsigned) = match op_text.as_str() {
        "+" => (BinOp::Add, false),
        "-" => (BinOp::Sub, false),
        "*" => (BinOp::Mul, false),
        "/" => (BinOp::Quo, false),
        "%" => (BinOp::Rem, false),
        "&" => (BinOp::And, false),
        "|" => (BinOp::Or, false),
        "^" => (BinOp::Xor, false),
        "<<" => (BinOp::Shl, false),
        ">>" => (BinOp::Shr, false),
        ">>>" => (BinOp::Shr, true),
        "&&" => (BinOp::LAnd, false),
        "||" => (BinOp::LOr, false),
        "==" => (BinOp::Eql, false),
        "!=" => (BinOp::Neq, false),
        "<" => (BinOp::Lss, false),
        ">" => (BinOp::Gtr, false),
        "<=" => (BinOp::Leq, false),
        ">=" => (BinOp::Geq, false),
        other => {
            return Err(TranslateError::invariant(format!(
                "Unknown binary operator \"{}\"",
                other
            )))
        }
    };

    let x = match node.child_by_field_name("left") {
        Some(l) => lower_expr(lo, scope, owner, l)?,
        None => return Err(TranslateError::invariant("binary expression without left")),
    };
    let y = match node.child_by_field_name("right") {
        Some(r) => lower_expr(lo, scope, owner, r)?,
        None => return Err(TranslateError::invariant("binary expression without right")),
    };

    Ok(Expr::Binary {
        x: Box::new(x),
        op,
        y: Box::new(y),
        unsigned,
    })
}

fn lower_unary(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Expr> {
    let op = match node
        .child_by_field_name("operator")
        .map(|o| lo.text(o).to_string())
        .unwrap_or_default()
        .as_str()
    {
        "!" => UnaryOp::Not,
        "~" => UnaryOp::BitNot,
        "+" => UnaryOp::Add,
        "-" => UnaryOp::Sub,
        other => {
            return Err(TranslateError::invariant(format!(
                "Unknown unary operator \"{}\"",
                other
            )))
        }
    };

    let x = match node.child_by_field_name("operand") {
        Some(o) => lower_expr(lo, scope, owner, o)?,
        None => return Err(TranslateError::invariant("unary expression without operand")),
    };

    Ok(Expr::Unary {
        op,
        x: Box::new(x),
    })
}

fn lower_update(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Expr> {
    let text = lo.text(node);
    let op = if text.contains("++") {
        UnaryOp::Inc
    } else {
        UnaryOp::Dec
    };

    let operand = match node.named_child(0) {
        Some(o) => lower_expr(lo, scope, owner, o)?,
        None => return Err(TranslateError::invariant("update expression without operand")),
    };

    Ok(Expr::Unary {
        op,
        x: Box::new(operand),
    })
}

fn lower_array_access(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Var> {
    let array = node.child_by_field_name("array");
    let index = match node.child_by_field_name("index") {
        Some(i) => lower_expr(lo, scope, owner, i)?,
        None => return Err(TranslateError::invariant("array access without index")),
    };

    let (base, obj) = match array {
        Some(a) if a.kind() == "identifier" => {
            let name = TypeName::new(lo.text(a));
            match scope.find_variable(&name) {
                Some(v) => (Some(v), None),
                None => {
                    tracing::warn!("Cannot find array variable {}", name);
                    (Some(fake_var(&format!("<<unimp_arrayref_{}>>", name), 0)), None)
                }
            }
        }
        Some(a) => (None, Some(Box::new(lower_expr(lo, scope, owner, a)?))),
        None => return Err(TranslateError::invariant("array access without array")),
    };

    Ok(new_var(VarKind::Index(ArrayIndex {
        base,
        obj,
        index: Box::new(index),
    })))
}

/// Resolve an identifier to a variable, or keep the raw name as a fake.
fn find_or_fake(lo: &Lowerer, scope: &Scope, node: Node) -> Var {
    let name = TypeName::new(lo.text(node));
    match scope.find_variable(&name) {
        Some(v) => v,
        None => fake_var(&name.to_string(), 0),
    }
}

/// The dotted-name view of an expression, when it is a pure identifier
/// chain (`System.out`, `foo.bar.baz`).
fn name_path(lo: &Lowerer, node: Node) -> Option<TypeName> {
    match node.kind() {
        "identifier" | "scoped_identifier" | "type_identifier" => {
            Some(TypeName::new(lo.text(node)))
        }
        "field_access" => {
            let object = node.child_by_field_name("object")?;
            let field = node.child_by_field_name("field")?;
            let base = name_path(lo, object)?;
            Some(TypeName::new(&format!(
                "{}.{}",
                base,
                lo.text(field)
            )))
        }
        _ => None,
    }
}

fn lower_field_access(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Expr> {
    let object = node.child_by_field_name("object");
    let field = node
        .child_by_field_name("field")
        .map(|f| lo.text(f).to_string())
        .unwrap_or_default();

    match object {
        Some(obj) if obj.kind() == "this" => {
            // this.field selects through the receiver
            let receiver = scope.receiver(&lo.program);
            let rvar = scope
                .find_variable(&TypeName::new(&receiver))
                .unwrap_or_else(|| {
                    scope.add_variable(&receiver, &Default::default(), None, false, "")
                });
            let fvar = scope
                .find_variable(&TypeName::new(&field))
                .unwrap_or_else(|| fake_var(&field, 0));
            Ok(Expr::Var(new_var(VarKind::Selector {
                x: rvar,
                sel: fvar,
            })))
        }
        Some(obj) if obj.kind() == "super" => {
            tracing::warn!("Not converting super.{}", field);
            Ok(Expr::Var(fake_var("<<super>>", 0)))
        }
        Some(obj) => match name_path(lo, node) {
            // a pure name chain resolves like a dotted variable lookup
            Some(path) => match scope.find_variable(&path) {
                Some(v) => Ok(Expr::Var(v)),
                None => Ok(Expr::Var(fake_var(&path.to_string(), 0))),
            },
            None => {
                tracing::warn!("Inadequately wrapping field access .{}", field);
                let x = lower_expr(lo, scope, owner, obj)?;
                let ref_var = scope
                    .find_variable(&TypeName::new(&field))
                    .unwrap_or_else(|| fake_var(&format!("<<unimp_objdotname_{}>>", field), 0));
                Ok(Expr::Var(new_var(VarKind::ObjectDotName {
                    x: Box::new(x),
                    ref_var,
                })))
            }
        },
        None => Ok(Expr::Var(fake_var(&field, 0))),
    }
}

/// Look a method up on `class`, then on the caller's owner; when neither
/// knows it, record a forward reference on both.
pub(crate) fn find_method(
    owner: &ClassRc,
    class: &ClassRc,
    name: &str,
    args: &Args,
) -> Result<MethodRc> {
    let arg_types = args.type_vector();

    if !class.borrow().is_nil() {
        if let Some(m) = class.borrow().find_method(name, &arg_types) {
            return Ok(m);
        }
    }

    if !owner.borrow().is_nil() {
        if let Some(m) = owner.borrow().find_method(name, &arg_types) {
            return Ok(m);
        }
    }

    let class_is_nil = class.borrow().is_nil();
    let owner_is_nil = owner.borrow().is_nil();
    if class_is_nil && owner_is_nil {
        return Err(TranslateError::invariant(
            "Both class and owner are nil during method lookup",
        ));
    }

    let class_name = if class_is_nil {
        None
    } else {
        Some(class.borrow().name())
    };

    let mref = new_method(Method::Reference(MethodReference {
        class_name,
        name: name.to_string(),
        go_name: name.to_string(),
        arg_types,
        resolved: None,
    }));

    if !class_is_nil {
        class.borrow_mut().add_method(mref.clone());
    } else {
        tracing::warn!("No class for method reference {}", name);
    }
    if !owner_is_nil && !Rc::ptr_eq(owner, class) {
        owner.borrow_mut().add_method(mref.clone());
    }

    Ok(mref)
}

fn lower_method_invocation(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Expr> {
    let name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(TranslateError::invariant("method invocation without a name"));
    }

    let args = match node.child_by_field_name("arguments") {
        Some(a) => lower_arguments(lo, scope, owner, a)?,
        None => Args::default(),
    };

    let object = node.child_by_field_name("object");

    let object = match object {
        None => {
            // bare call: resolve against the owner only
            let method = find_method(owner, &lo.nil_owner.clone(), &name, &args)?;
            return Ok(Expr::Call(crate::model::MethodCall {
                recv: CallRecv::None,
                method,
                args,
            }));
        }
        Some(o) => o,
    };

    if matches!(object.kind(), "this" | "super") {
        let e = lower_expr(lo, scope, owner, object)?;
        let class = scope.class().unwrap_or_else(|| lo.nil_owner.clone());
        let method = find_method(owner, &class, &name, &args)?;
        return Ok(Expr::Call(crate::model::MethodCall {
            recv: CallRecv::Expr(Box::new(e)),
            method,
            args,
        }));
    }

    if let Some(path) = name_path(lo, object) {
        if let Some(v) = scope.find_variable(&path) {
            // an instance call through a variable
            let method = find_method(owner, owner, &name, &args)?;
            return Ok(Expr::Call(crate::model::MethodCall {
                recv: CallRecv::Var(v),
                method,
                args,
            }));
        }

        let class = match scope.find_class(&lo.program, None, path.last_type()) {
            Some(c) => c,
            // an unknown qualifier becomes a fake owner for dispatch
            None => new_class(Class::Fake(FakeClass {
                name: path.to_string(),
                package: None,
                methods: Default::default(),
            })),
        };

        let method = find_method(owner, &class, &name, &args)?;
        return Ok(Expr::Call(crate::model::MethodCall {
            recv: CallRecv::None,
            method,
            args,
        }));
    }

    // a call through an arbitrary expression
    let e = lower_expr(lo, scope, owner, object)?;
    let class = scope.class().unwrap_or_else(|| lo.nil_owner.clone());
    let method = find_method(owner, &class, &name, &args)?;
    Ok(Expr::Call(crate::model::MethodCall {
        recv: CallRecv::Expr(Box::new(e)),
        method,
        args,
    }))
}

fn lower_alloc(lo: &mut Lowerer, scope: &Scope, owner: &ClassRc, node: Node) -> Result<Expr> {
    let (tname, _dims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => return Err(TranslateError::invariant("allocation without a type")),
    };

    if tname.is_primitive() {
        return Err(TranslateError::invariant(format!(
            "Class allocation should not use primitive \"{}\"",
            tname
        )));
    }

    let mut args = Vec::new();
    if let Some(arg_node) = node.child_by_field_name("arguments") {
        args = lower_arguments(lo, scope, owner, arg_node)?.args;
    }

    let alloc_name = tname.to_string();
    let owner_key = owner.borrow().key();

    // an anonymous class body becomes a fresh top-level class
    let body = node
        .named_children(&mut node.walk())
        .find(|n| n.kind() == "class_body");

    let cref = match body {
        Some(body_node) => {
            let mut n = 0;
            let anon_name = loop {
                let candidate = format!("Anonymous_{}_{}", alloc_name, n);
                if scope
                    .find_class(&lo.program, Some(&owner_key), &candidate)
                    .is_none()
                {
                    break candidate;
                }
                n += 1;
            };

            let def = ClassDef::new(&anon_name, Some(owner_key.clone()));
            let cls = scope.add_class(&mut lo.program, Class::Def(def));

            let body_scope = scope.class_child(cls.clone());
            super::decls::lower_class_body(lo, &body_scope, &cls, body_node)?;
            cls
        }
        None => match scope.find_class(&lo.program, Some(&owner_key), &alloc_name) {
            Some(c) => c,
            None => scope.add_class(
                &mut lo.program,
                Class::Ref(crate::model::ClassReference {
                    name: alloc_name.clone(),
                    parent_key: Some(owner_key),
                    methods: Default::default(),
                }),
            ),
        },
    };

    let ctor_name = format!("New{}", cref.borrow().name());
    let arg_list = Args::new(args);
    let method = find_method(owner, &cref, &ctor_name, &arg_list)?;

    Ok(Expr::ClassAlloc(ClassAlloc {
        class: cref,
        method,
        args: arg_list.args,
    }))
}

fn lower_array_alloc(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Expr> {
    let (tname, type_dims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => return Err(TranslateError::invariant("array allocation without a type")),
    };

    let mut dim_exprs = Vec::new();
    let mut empty_dims = type_dims;

    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "dimensions_expr" => {
                if let Some(e) = child.named_child(0) {
                    dim_exprs.push(lower_expr(lo, scope, owner, e)?);
                }
            }
            "dimensions" => {
                empty_dims += lo.text(child).matches('[').count();
            }
            _ => {}
        }
    }

    let init = node
        .child_by_field_name("value")
        .filter(|n| n.kind() == "array_initializer");

    if !dim_exprs.is_empty() && init.is_some() {
        return Err(TranslateError::invariant(format!(
            "Array allocation has both dimension expressions ({}) and an initializer",
            dim_exprs.len()
        )));
    }

    if !dim_exprs.is_empty() {
        // make([]T, n): the element type carries any extra empty dims
        let td = lo.create_type_data(&tname, empty_dims)?;
        return Ok(Expr::ArrayAlloc {
            ty: td,
            args: dim_exprs,
        });
    }

    let td = lo.create_type_data(&tname, empty_dims.max(1))?;
    let elems = match init {
        Some(i) => lower_initializer_elements(lo, scope, owner, i)?,
        None => vec![],
    };

    Ok(Expr::ArrayInit { ty: td, elems })
}

/// Lower the elements of an `{ ... }` array initializer. Nested brace
/// lists become untyped composite literals.
pub(crate) fn lower_initializer_elements(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Vec<Expr>> {
    let mut elements = Vec::new();
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    for child in children {
        if child.kind() == "array_initializer" {
            let vi = lower_var_init(lo, scope, owner, child, None)?;
            elements.push(Expr::VarInitExpr(vi));
        } else {
            elements.push(lower_expr(lo, scope, owner, child)?);
        }
    }
    Ok(elements)
}

pub(crate) fn lower_var_init(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
    var: Option<Var>,
) -> Result<VarInitRc> {
    let elements = lower_initializer_elements(lo, scope, owner, node)?;
    Ok(Rc::new(RefCell::new(VarInit {
        var,
        expr: None,
        elements,
    })))
}

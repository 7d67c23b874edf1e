//! Lowering of declarations: classes, interfaces, enums, fields, methods.

use std::cell::RefCell;
use std::rc::Rc;

use tree_sitter::Node;

use super::{stmts, Lowerer};
use crate::model::{
    new_class, new_method, Class, ClassDef, ClassMethod, ClassRc, Constant, Expr, FakeClass,
    IfaceMethod, Interface, InterfaceDef, Method, MethodKind, MethodRc, Stmt, VarInit,
};
use crate::model::{Args, Assign, Block, EnumDef};
use crate::modifiers::{fix_name, upper_initial, Modifiers, MOD_STATIC};
use crate::scope::Scope;
use crate::{Result, TranslateError};
use j2go_goast::token::AssignOp;

/// Collect the `modifiers` child of a declaration, if present.
pub(crate) fn modifiers(lo: &Lowerer, node: Node) -> Modifiers {
    let mut mods = Modifiers::default();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }

        let mut mod_cursor = child.walk();
        for m in child.children(&mut mod_cursor) {
            match m.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(name) = m.child_by_field_name("name") {
                        mods.add_annotation(lo.text(name));
                    }
                }
                keyword => {
                    if let Some(flag) = Modifiers::flag_for(keyword) {
                        mods.set(flag);
                    }
                }
            }
        }
    }

    mods
}

pub(crate) fn lower_class_decl(
    lo: &mut Lowerer,
    scope: &Scope,
    parent: Option<&ClassRc>,
    node: Node,
) -> Result<()> {
    let name = match node.child_by_field_name("name") {
        Some(n) => lo.text(n).to_string(),
        None => return Err(TranslateError::invariant("class declaration without a name")),
    };

    let parent_key = parent.map(|p| p.borrow().key());
    let cls = scope.add_class(&mut lo.program, Class::Def(ClassDef::new(&name, parent_key)));

    // resolve `extends`: the superclass becomes an embedded pointer field
    if let Some(superclass) = node.child_by_field_name("superclass") {
        if let Some(ty) = superclass.named_children(&mut superclass.walk()).next() {
            let (tname, dims) = lo.type_info(ty);
            if dims != 0 {
                tracing::warn!("Class {} cannot extend array {}", name, tname);
            }

            let ext_name = tname.last_type().to_string();
            let sup = match lo.program.find_class(&ext_name) {
                Some(s) => s,
                None => {
                    let fake = new_class(Class::Fake(FakeClass {
                        name: ext_name,
                        package: None,
                        methods: Default::default(),
                    }));
                    lo.program.add_class(fake.clone());
                    fake
                }
            };

            if let Class::Def(d) = &mut *cls.borrow_mut() {
                d.super_class = Some(sup);
            }
        }
    }

    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        let mut list = Vec::new();
        let mut cursor = interfaces.walk();
        for type_list in interfaces.named_children(&mut cursor) {
            let mut tl_cursor = type_list.walk();
            for ty in type_list.named_children(&mut tl_cursor) {
                let (tname, _) = lo.type_info(ty);
                let iface = match lo.program.find_interface(&tname) {
                    Some(i) => i,
                    None => lo.program.add_interface_reference(&tname),
                };
                list.push(iface);
            }
        }

        if let Class::Def(d) = &mut *cls.borrow_mut() {
            d.interfaces = list;
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let body_scope = scope.class_child(cls.clone());
        lower_class_body(lo, &body_scope, &cls, body)?;
    }

    Ok(())
}

pub(crate) fn lower_class_body(
    lo: &mut Lowerer,
    scope: &Scope,
    cls: &ClassRc,
    body: Node,
) -> Result<()> {
    let mut cursor = body.walk();
    let children: Vec<Node> = body.named_children(&mut cursor).collect();

    for child in children {
        match child.kind() {
            "field_declaration" => lower_field_decl(lo, scope, cls, child)?,
            "method_declaration" | "constructor_declaration" => {
                let m = lower_method(lo, scope, cls, child)?;
                cls.borrow_mut().add_method(m);
            }
            "class_declaration" => lower_class_decl(lo, scope, Some(cls), child)?,
            "interface_declaration" => {
                tracing::warn!("Not adding nested interface to class {}", cls.borrow().name());
            }
            "enum_declaration" => lower_enum_decl(lo, child),
            "static_initializer" | "block" => {
                // initializer blocks become a static init function
                let blk_node = if child.kind() == "static_initializer" {
                    child
                        .named_children(&mut child.walk())
                        .find(|n| n.kind() == "block")
                        .unwrap_or(child)
                } else {
                    child
                };
                let blk = stmts::lower_block(lo, scope, cls, blk_node)?;
                let class_name = cls.borrow().name();
                cls.borrow_mut().add_method(new_method(Method::Class(ClassMethod {
                    class_name,
                    name: "init".to_string(),
                    go_name: "init".to_string(),
                    ret: None,
                    rcvr: None,
                    kind: MethodKind::Static,
                    params: vec![],
                    body: Some(blk),
                })));
            }
            "line_comment" | "block_comment" => {}
            other => {
                tracing::warn!("Ignoring class body member {}", other);
            }
        }
    }

    Ok(())
}

fn lower_field_decl(lo: &mut Lowerer, scope: &Scope, cls: &ClassRc, node: Node) -> Result<()> {
    let mods = modifiers(lo, node);
    let (tname, tdims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => return Ok(()),
    };

    let receiver = scope.receiver(&lo.program);

    let mut cursor = node.walk();
    let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();

    for decl in declarators {
        let name = match decl.child_by_field_name("name") {
            Some(n) => lo.text(n).to_string(),
            None => continue,
        };

        // "String[] a[]" declares a 2-D array
        let extra = decl
            .named_children(&mut decl.walk())
            .filter(|n| n.kind() == "dimensions")
            .map(|n| lo.text(n).matches('[').count())
            .sum::<usize>();

        let td = lo.create_type_data(&tname, tdims + extra)?;
        let var = scope.add_variable(&name, &mods, Some(td), true, &receiver);

        let init = match decl.child_by_field_name("value") {
            None => VarInit {
                var: Some(var),
                expr: None,
                elements: vec![],
            },
            Some(value) if value.kind() == "array_initializer" => {
                let elements = super::exprs::lower_initializer_elements(lo, scope, cls, value)?;
                VarInit {
                    var: Some(var),
                    expr: None,
                    elements,
                }
            }
            Some(value) => VarInit {
                var: Some(var),
                expr: Some(super::exprs::lower_expr(lo, scope, cls, value)?),
                elements: vec![],
            },
        };

        if let Class::Def(d) = &mut *cls.borrow_mut() {
            d.add_var(init);
        }
    }

    Ok(())
}

pub(crate) fn lower_method(
    lo: &mut Lowerer,
    scope: &Scope,
    cls: &ClassRc,
    node: Node,
) -> Result<MethodRc> {
    let mods = modifiers(lo, node);
    let is_ctor = node.kind() == "constructor_declaration";
    let java_name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();

    let mut kind = if mods.has_annotation("Test") {
        MethodKind::Test
    } else if is_ctor {
        MethodKind::Constructor
    } else if mods.is_set(MOD_STATIC) {
        MethodKind::Static
    } else {
        MethodKind::Instance
    };

    let mut name = java_name.clone();
    let mut go_name = fix_name(&java_name, &mods);
    if kind == MethodKind::Constructor {
        name = format!("New{}", name);
        go_name = format!("New{}", go_name);
    } else if kind == MethodKind::Static && go_name == "Main" {
        go_name = "main".to_string();
        kind = MethodKind::Main;
    }

    let method_scope = scope.child();

    let mut params = Vec::new();
    if let Some(param_list) = node.child_by_field_name("parameters") {
        if kind == MethodKind::Test {
            if param_list.named_child_count() > 0 {
                tracing::warn!("Ignoring test method params for {}", java_name);
            }
        } else {
            let mut cursor = param_list.walk();
            for param in param_list.named_children(&mut cursor) {
                match param.kind() {
                    "formal_parameter" => {
                        let p_mods = modifiers(lo, param);
                        let (ptype, pdims) = match param.child_by_field_name("type") {
                            Some(t) => lo.type_info(t),
                            None => continue,
                        };
                        let extra = param
                            .named_children(&mut param.walk())
                            .filter(|n| n.kind() == "dimensions")
                            .map(|n| lo.text(n).matches('[').count())
                            .sum::<usize>();
                        let pname = param
                            .child_by_field_name("name")
                            .map(|n| lo.text(n).to_string())
                            .unwrap_or_default();

                        let td = lo.create_type_data(&ptype, pdims + extra)?;
                        params.push(method_scope.add_variable(
                            &pname,
                            &p_mods,
                            Some(td),
                            false,
                            "",
                        ));
                    }
                    "spread_parameter" => {
                        tracing::warn!("Ignoring varargs parameter for {}", java_name);
                    }
                    _ => {}
                }
            }
        }
    }

    let rcvr = if matches!(kind, MethodKind::Constructor | MethodKind::Instance) {
        let receiver = scope.receiver(&lo.program);
        Some(method_scope.add_variable(&receiver, &Modifiers::default(), None, false, ""))
    } else {
        None
    };

    let ret = match node.child_by_field_name("type") {
        Some(t) if matches!(kind, MethodKind::Instance | MethodKind::Static) => {
            let (tname, dims) = lo.type_info(t);
            Some(lo.create_type_data(&tname, dims)?)
        }
        _ => None,
    };

    let body = match node.child_by_field_name("body") {
        Some(b) => Some(stmts::lower_block(lo, &method_scope, cls, b)?),
        None => None,
    };

    let class_name = cls.borrow().name();
    let mut method = ClassMethod {
        class_name: class_name.clone(),
        name,
        go_name,
        ret,
        rcvr: rcvr.clone(),
        kind,
        params,
        body,
    };

    if kind == MethodKind::Test {
        lo.program.add_import("testing", None);
    }

    if kind == MethodKind::Constructor {
        fix_constructor(&mut method, cls, rcvr.expect("constructor without receiver"));
    }

    Ok(new_method(Method::Class(method)))
}

/// Constructor fixup: resolve `this(...)`/`super(...)` delegation, ensure
/// the receiver is created first, and return it last.
fn fix_constructor(method: &mut ClassMethod, cls: &ClassRc, rcvr: crate::model::Var) {
    let class_name = method.class_name.clone();
    let super_name = cls.borrow().super_name();

    let body = method.body.get_or_insert_with(Block::default);

    let mut has_this = false;
    if let Some(first) = body.stmts.first_mut() {
        if let Stmt::Expr(Expr::CtorCall { is_super, args }) = first {
            let is_super = *is_super;
            let args = std::mem::take(args);
            if !is_super {
                *first = Stmt::NewStruct {
                    rcvr: rcvr.clone(),
                    class: class_name.clone(),
                    is_super: false,
                    args,
                };
                has_this = true;
            } else if let Some(sup) = super_name {
                *first = Stmt::NewStruct {
                    rcvr: rcvr.clone(),
                    class: sup,
                    is_super: true,
                    args,
                };
            } else {
                // super() called on a class without a superclass
                *first = receiver_create(&rcvr, &class_name);
                has_this = true;
            }
        }
    }

    if !has_this {
        body.stmts.insert(0, receiver_create(&rcvr, &class_name));
    }

    body.stmts.push(Stmt::Return(Some(Expr::Var(rcvr))));
}

fn receiver_create(rcvr: &crate::model::Var, class_name: &str) -> Stmt {
    Stmt::Assign(Assign {
        lhs: rcvr.clone(),
        op: AssignOp::Define,
        rhs: vec![Expr::StructRef {
            class: class_name.to_string(),
        }],
    })
}

pub(crate) fn lower_enum_decl(lo: &mut Lowerer, node: Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();

    if node.child_by_field_name("interfaces").is_some() {
        tracing::warn!("Ignoring enum {} interfaces", name);
    }

    let mut constants = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "enum_constant" => {
                    let cname = child
                        .child_by_field_name("name")
                        .map(|n| lo.text(n).to_string())
                        .unwrap_or_default();
                    if child.child_by_field_name("arguments").is_some() {
                        tracing::warn!("Ignoring enum constant {}.{} arguments", name, cname);
                    }
                    if child.child_by_field_name("body").is_some() {
                        tracing::warn!("Ignoring enum constant {}.{} body", name, cname);
                    }
                    constants.push(cname);
                }
                "enum_body_declarations" => {
                    tracing::warn!("Ignoring enum {} body declarations", name);
                }
                _ => {}
            }
        }
    }

    lo.program.add_enum(EnumDef { name, constants });
}

pub(crate) fn lower_interface_decl(lo: &mut Lowerer, node: Node) -> Result<()> {
    let name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();

    let mut def = InterfaceDef {
        name: name.clone(),
        ..InterfaceDef::default()
    };

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        let children: Vec<Node> = body.named_children(&mut cursor).collect();

        for child in children {
            match child.kind() {
                "constant_declaration" => {
                    lower_interface_constant(lo, &mut def, child)?;
                }
                "method_declaration" => {
                    if child.child_by_field_name("body").is_some() {
                        tracing::warn!("Ignoring default method body in interface {}", name);
                    }
                    let m = lower_interface_method(lo, child)?;
                    def.methods.add_method(m);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    tracing::warn!("Not adding {} to interface {}", child.kind(), name);
                }
                "line_comment" | "block_comment" => {}
                other => tracing::warn!("Ignoring interface member {}", other),
            }
        }
    }

    lo.program.add_interface_definition(Interface::Def(def));
    Ok(())
}

fn lower_interface_constant(
    lo: &mut Lowerer,
    def: &mut InterfaceDef,
    node: Node,
) -> Result<()> {
    let (tname, tdims) = match node.child_by_field_name("type") {
        Some(t) => lo.type_info(t),
        None => return Ok(()),
    };

    let scope = Scope::root();
    let nil_owner = lo.nil_owner.clone();

    let mut cursor = node.walk();
    let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();

    for decl in declarators {
        let cname = match decl.child_by_field_name("name") {
            Some(n) => lo.text(n).to_string(),
            None => continue,
        };

        let ty = lo.create_type_data(&tname, tdims)?;
        let init = match decl.child_by_field_name("value") {
            Some(value) => Some(Rc::new(RefCell::new(VarInit {
                var: None,
                expr: Some(super::exprs::lower_expr(lo, &scope, &nil_owner, value)?),
                elements: vec![],
            }))),
            None => None,
        };

        def.constants.push(Rc::new(RefCell::new(Constant {
            name: cname,
            ty,
            init,
        })));
    }

    Ok(())
}

fn lower_interface_method(lo: &mut Lowerer, node: Node) -> Result<MethodRc> {
    let name = node
        .child_by_field_name("name")
        .map(|n| lo.text(n).to_string())
        .unwrap_or_default();
    let go_name = upper_initial(&name);

    let scope = Scope::root();
    let mut params = Vec::new();
    if let Some(param_list) = node.child_by_field_name("parameters") {
        let mut cursor = param_list.walk();
        for param in param_list.named_children(&mut cursor) {
            if param.kind() != "formal_parameter" {
                if param.kind() == "spread_parameter" {
                    tracing::warn!("Ignoring interface varargs for {}", name);
                }
                continue;
            }

            let p_mods = modifiers(lo, param);
            let (ptype, pdims) = match param.child_by_field_name("type") {
                Some(t) => lo.type_info(t),
                None => continue,
            };
            let pname = param
                .child_by_field_name("name")
                .map(|n| lo.text(n).to_string())
                .unwrap_or_default();

            let td = lo.create_type_data(&ptype, pdims)?;
            params.push(scope.add_variable(&pname, &p_mods, Some(td), false, ""));
        }
    }

    let ret = match node.child_by_field_name("type") {
        Some(t) => {
            let (tname, dims) = lo.type_info(t);
            Some(lo.create_type_data(&tname, dims)?)
        }
        None => None,
    };

    Ok(new_method(Method::Iface(IfaceMethod {
        name,
        go_name,
        params,
        ret,
    })))
}

/// Shared by statement and expression lowering: `this(...)` / `super(...)`.
pub(crate) fn lower_ctor_invocation(
    lo: &mut Lowerer,
    scope: &Scope,
    owner: &ClassRc,
    node: Node,
) -> Result<Expr> {
    let is_super = node
        .child_by_field_name("constructor")
        .map(|c| c.kind() == "super")
        .unwrap_or(false);

    let args = match node.child_by_field_name("arguments") {
        Some(a) => super::exprs::lower_arguments(lo, scope, owner, a)?,
        None => Args::default(),
    };

    Ok(Expr::CtorCall { is_super, args })
}

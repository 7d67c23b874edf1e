//! The rewrite pipeline: an ordered list of rules applied post-order over
//! the program model, each rule in its own full traversal.
//!
//! Rules replace Java library idioms with Go ones after lowering has done
//! the structural work. A rule sees each node through a mutable reference
//! and may overwrite it in place; children are always visited before
//! their parent. Rules may add imports and fake classes through
//! [`RewriteCtx`] but must never call back into lowering.

use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::config::Config;
use crate::model::{
    fake_method, fake_var, new_class, Args, Assign, CallRecv, Class, ClassRc, Expr, FakeClass,
    ImportSet, Keyword, Literal, Method, MethodCall, MethodKind, MethodRc, Program, Stmt, Var,
    VarInitRc, VarKind, DEFAULT_RECEIVER,
};
use crate::model::{new_var, ArrayIndex};
use crate::typedata::{self, TypeData};
use j2go_goast::token::{AssignOp, BinOp};

/// Java collection classes treated as growable arrays.
const LIST_CLASSES: &[&str] = &["List", "ArrayList", "LinkedList", "Stack", "Vector"];

/// Program-level state a rule is allowed to touch.
pub struct RewriteCtx<'a> {
    pub imports: &'a mut ImportSet,
    pub classes: &'a mut FxHashMap<String, ClassRc>,
    pub config: &'a Config,
    pub package: &'a str,
    pub java_package: &'a str,
}

impl RewriteCtx<'_> {
    pub fn add_import(&mut self, pkg: &str) {
        if pkg != self.package {
            self.imports.add(pkg, None);
        }
    }

    /// The `fmt` fake class, created (and imported) on first use.
    pub fn fmt_class(&mut self) -> ClassRc {
        if let Some(c) = self.classes.get("fmt") {
            return c.clone();
        }

        let fake = new_class(Class::Fake(FakeClass {
            name: "fmt".to_string(),
            package: None,
            methods: Default::default(),
        }));
        self.classes.insert("fmt".to_string(), fake.clone());
        self.add_import("fmt");
        fake
    }

    /// The receiver name for a class, per the configuration.
    pub fn receiver(&self, class_name: &str) -> String {
        let qualified = if self.java_package.is_empty() {
            class_name.to_string()
        } else {
            format!("{}.{}", self.java_package, class_name)
        };

        self.config
            .receiver(&qualified)
            .or_else(|| self.config.receiver(class_name))
            .unwrap_or(DEFAULT_RECEIVER)
            .to_string()
    }
}

/// One rewrite rule. Hooks default to no-ops; a rule overrides the node
/// categories it cares about and mutates the node in place to replace it.
pub trait RewriteRule {
    fn name(&self) -> &'static str;

    fn rewrite_expr(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, _expr: &mut Expr) {}
    fn rewrite_stmt(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, _stmt: &mut Stmt) {}
    fn rewrite_var(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, _var: &Var) {}
    fn rewrite_method(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, _method: &MethodRc) {}
}

/// The standard rule list, in application order.
pub fn standard_rules() -> Vec<Box<dyn RewriteRule>> {
    vec![
        Box::new(ArrayLenRule),
        Box::new(SysFileRule),
        Box::new(MainArgsRule),
        Box::new(ThisArgRule),
        Box::new(ListMethodsRule),
        Box::new(ToStringRule),
        Box::new(StringAdditionRule),
        Box::new(StringFormatRule),
    ]
}

impl Program {
    /// Apply each rule over the whole program, in sequence.
    pub fn run_rules(&mut self, rules: &[Box<dyn RewriteRule>]) {
        for rule in rules {
            self.run_rule(rule.as_ref());
        }
    }

    pub fn run_rule(&mut self, rule: &dyn RewriteRule) {
        let mut keys: Vec<String> = self.classes.keys().cloned().collect();
        keys.sort();
        let classes: Vec<ClassRc> = keys.iter().map(|k| self.classes[k].clone()).collect();

        let package = self.package.clone();
        let java_package = self.java_package.clone();
        let config = self.config.clone();
        let mut ctx = RewriteCtx {
            imports: &mut self.imports,
            classes: &mut self.classes,
            config: config.as_ref(),
            package: &package,
            java_package: &java_package,
        };

        for cls in classes {
            rewrite_class(&cls, rule, &mut ctx);
        }
    }
}

fn rewrite_class(cls: &ClassRc, rule: &dyn RewriteRule, ctx: &mut RewriteCtx) {
    let (constants, vars, statics, methods) = {
        let b = cls.borrow();
        match &*b {
            Class::Def(d) => (
                d.constants.clone(),
                d.vars.clone(),
                d.statics.clone(),
                d.methods.all(),
            ),
            // references and fakes own no traversable bodies
            _ => return,
        }
    };

    for con in &constants {
        let init = con.borrow().init.clone();
        if let Some(vi) = init {
            rewrite_varinit(&vi, rule, ctx, Some(cls));
        }
    }

    for vi in vars.iter().chain(statics.iter()) {
        rewrite_varinit(vi, rule, ctx, Some(cls));
    }

    for m in &methods {
        rewrite_method_rc(m, rule, ctx, Some(cls));
    }
}

fn rewrite_method_rc(
    m: &MethodRc,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    // take the body out so rule callbacks can borrow the method cell
    let extracted = {
        let mut mb = m.borrow_mut();
        match &mut *mb {
            Method::Class(cm) => Some((cm.body.take(), cm.params.clone())),
            _ => None,
        }
    };

    if let Some((mut body, params)) = extracted {
        for p in &params {
            rewrite_var_node(p, rule, ctx, cls);
        }

        if let Some(b) = &mut body {
            for stmt in &mut b.stmts {
                rewrite_stmt_node(stmt, rule, ctx, cls);
            }
        }

        if let Method::Class(cm) = &mut *m.borrow_mut() {
            cm.body = body;
        }
    }

    rule.rewrite_method(ctx, cls, m);
}

fn rewrite_varinit(
    vi: &VarInitRc,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    {
        let mut b = vi.borrow_mut();
        if let Some(e) = &mut b.expr {
            rewrite_expr_node(e, rule, ctx, cls);
        }
        for e in &mut b.elements {
            rewrite_expr_node(e, rule, ctx, cls);
        }
    }

    let var = vi.borrow().var.clone();
    if let Some(v) = var {
        rewrite_var_node(&v, rule, ctx, cls);
    }
}

fn rewrite_assign(
    a: &mut Assign,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    rewrite_var_node(&a.lhs, rule, ctx, cls);
    for r in &mut a.rhs {
        rewrite_expr_node(r, rule, ctx, cls);
    }
}

fn rewrite_block(
    b: &mut crate::model::Block,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    for stmt in &mut b.stmts {
        rewrite_stmt_node(stmt, rule, ctx, cls);
    }
}

fn rewrite_stmt_node(
    stmt: &mut Stmt,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    match stmt {
        Stmt::Assign(a) => rewrite_assign(a, rule, ctx, cls),
        Stmt::Block(b) => rewrite_block(b, rule, ctx, cls),
        Stmt::Expr(e) => rewrite_expr_node(e, rule, ctx, cls),
        Stmt::ForColon { var, expr, body } => {
            rewrite_var_node(var, rule, ctx, cls);
            rewrite_expr_node(expr, rule, ctx, cls);
            rewrite_block(body, rule, ctx, cls);
        }
        Stmt::ForExpr {
            init,
            cond,
            incr,
            body,
        } => {
            for e in init.iter_mut().chain(incr.iter_mut()) {
                rewrite_expr_node(e, rule, ctx, cls);
            }
            if let Some(c) = cond {
                rewrite_expr_node(c, rule, ctx, cls);
            }
            rewrite_block(body, rule, ctx, cls);
        }
        Stmt::ForVar {
            var,
            init,
            cond,
            incr,
            body,
        } => {
            rewrite_var_node(var, rule, ctx, cls);
            if let Some(e) = init {
                rewrite_expr_node(e, rule, ctx, cls);
            }
            if let Some(c) = cond {
                rewrite_expr_node(c, rule, ctx, cls);
            }
            for s in incr.iter_mut() {
                rewrite_stmt_node(s, rule, ctx, cls);
            }
            rewrite_block(body, rule, ctx, cls);
        }
        Stmt::IfElse { cond, then, els } => {
            rewrite_expr_node(cond, rule, ctx, cls);
            rewrite_stmt_node(then, rule, ctx, cls);
            if let Some(e) = els {
                rewrite_stmt_node(e, rule, ctx, cls);
            }
        }
        Stmt::Labeled { stmt, .. } => rewrite_stmt_node(stmt, rule, ctx, cls),
        Stmt::LocalVarNoInit(v) => rewrite_var_node(v, rule, ctx, cls),
        Stmt::LocalVarInit { var, init } => {
            rewrite_var_node(var, rule, ctx, cls);
            rewrite_expr_node(init, rule, ctx, cls);
        }
        Stmt::LocalVarCast { var, cast } => {
            rewrite_var_node(var, rule, ctx, cls);
            rewrite_expr_node(cast, rule, ctx, cls);
        }
        Stmt::NewStruct { rcvr, args, .. } => {
            rewrite_var_node(rcvr, rule, ctx, cls);
            for a in &mut args.args {
                rewrite_expr_node(a, rule, ctx, cls);
            }
        }
        Stmt::Return(e) => {
            if let Some(e) = e {
                rewrite_expr_node(e, rule, ctx, cls);
            }
        }
        Stmt::Switch { expr, cases } => {
            rewrite_expr_node(expr, rule, ctx, cls);
            for case in cases {
                for label in &mut case.labels {
                    if let Some(e) = &mut label.expr {
                        rewrite_expr_node(e, rule, ctx, cls);
                    }
                }
                for s in &mut case.stmts {
                    rewrite_stmt_node(s, rule, ctx, cls);
                }
            }
        }
        Stmt::Synchronized { expr, block } => {
            rewrite_expr_node(expr, rule, ctx, cls);
            rewrite_block(block, rule, ctx, cls);
        }
        Stmt::Throw(e) => rewrite_expr_node(e, rule, ctx, cls),
        Stmt::Try(t) => {
            rewrite_block(&mut t.block, rule, ctx, cls);
            for c in &mut t.catches {
                rewrite_var_node(&c.var, rule, ctx, cls);
                rewrite_block(&mut c.block, rule, ctx, cls);
            }
            if let Some(f) = &mut t.finally {
                rewrite_block(f, rule, ctx, cls);
            }
        }
        Stmt::While { cond, stmt, .. } => {
            rewrite_expr_node(cond, rule, ctx, cls);
            rewrite_stmt_node(stmt, rule, ctx, cls);
        }
        Stmt::Branch { .. }
        | Stmt::JumpToLabel { .. }
        | Stmt::Unimplemented(_)
        | Stmt::Empty => {}
    }

    rule.rewrite_stmt(ctx, cls, stmt);
}

fn rewrite_expr_node(
    expr: &mut Expr,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    match expr {
        Expr::ArrayAlloc { args, .. } => {
            for a in args.iter_mut() {
                rewrite_expr_node(a, rule, ctx, cls);
            }
        }
        Expr::ArrayInit { elems, .. } => {
            for e in elems.iter_mut() {
                rewrite_expr_node(e, rule, ctx, cls);
            }
        }
        Expr::Assign(a) => rewrite_assign(a, rule, ctx, cls),
        Expr::Binary { x, y, .. } => {
            rewrite_expr_node(x, rule, ctx, cls);
            rewrite_expr_node(y, rule, ctx, cls);
        }
        Expr::Call(mc) => {
            match &mut mc.recv {
                CallRecv::Var(v) => rewrite_var_node(v, rule, ctx, cls),
                CallRecv::Expr(e) => rewrite_expr_node(e, rule, ctx, cls),
                CallRecv::None => {}
            }
            for a in &mut mc.args.args {
                rewrite_expr_node(a, rule, ctx, cls);
            }
            rule.rewrite_method(ctx, cls, &mc.method);
        }
        Expr::Cast { target, .. } => rewrite_expr_node(target, rule, ctx, cls),
        Expr::ClassAlloc(alloc) => {
            for a in &mut alloc.args {
                rewrite_expr_node(a, rule, ctx, cls);
            }
        }
        Expr::CtorCall { args, .. } => {
            for a in &mut args.args {
                rewrite_expr_node(a, rule, ctx, cls);
            }
        }
        Expr::InstanceOf { expr: e, ty_var } => {
            rewrite_expr_node(e, rule, ctx, cls);
            rewrite_var_node(ty_var, rule, ctx, cls);
        }
        Expr::Unary { x, .. } => rewrite_expr_node(x, rule, ctx, cls),
        Expr::Var(v) => rewrite_var_node(v, rule, ctx, cls),
        Expr::VarInitExpr(vi) => rewrite_varinit(vi, rule, ctx, cls),
        Expr::Keyword(_)
        | Expr::Literal(_)
        | Expr::PkgName { .. }
        | Expr::StructRef { .. }
        | Expr::Unimplemented(_) => {}
    }

    rule.rewrite_expr(ctx, cls, expr);
}

fn rewrite_var_node(
    v: &Var,
    rule: &dyn RewriteRule,
    ctx: &mut RewriteCtx,
    cls: Option<&ClassRc>,
) {
    let children: Vec<Var> = match &*v.borrow() {
        VarKind::Attribute { base, .. } => vec![base.clone()],
        VarKind::Selector { x, sel } => vec![x.clone(), sel.clone()],
        VarKind::ObjectDotName { ref_var, .. } => vec![ref_var.clone()],
        VarKind::Index(ai) => ai.base.iter().cloned().collect(),
        _ => vec![],
    };
    for child in children {
        rewrite_var_node(&child, rule, ctx, cls);
    }

    {
        let mut vb = v.borrow_mut();
        match &mut *vb {
            VarKind::ObjectDotName { x, .. } => rewrite_expr_node(x, rule, ctx, cls),
            VarKind::Index(ai) => {
                if let Some(obj) = &mut ai.obj {
                    rewrite_expr_node(obj, rule, ctx, cls);
                }
                rewrite_expr_node(&mut ai.index, rule, ctx, cls);
            }
            _ => {}
        }
    }

    rule.rewrite_var(ctx, cls, v);
}

/// The shared `fmt.Sprintf` fake, registered on the fmt class so repeated
/// lookups reuse one method object.
fn sprintf_method(ctx: &mut RewriteCtx) -> MethodRc {
    let fmt = ctx.fmt_class();
    let existing = fmt.borrow().find_method("Sprintf", &[]);
    match existing {
        Some(m) => m,
        None => {
            let m = fake_method(Some("fmt"), "Sprintf", Some(typedata::string_type()));
            fmt.borrow_mut().add_method(m.clone());
            m
        }
    }
}

fn len_call(v: Var) -> Expr {
    Expr::Call(MethodCall {
        recv: CallRecv::None,
        method: fake_method(None, "len", Some(typedata::int_type())),
        args: Args::new(vec![Expr::Var(v)]),
    })
}

// ---------------------------------------------------------------------------
// rule 1: array.length -> len(array)

struct ArrayLenRule;

impl RewriteRule for ArrayLenRule {
    fn name(&self) -> &'static str {
        "array-len"
    }

    fn rewrite_expr(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, expr: &mut Expr) {
        let base = match expr {
            Expr::Var(v) => match &*v.borrow() {
                VarKind::Attribute { base, suffix } if suffix == "length" => {
                    let is_array = base
                        .borrow()
                        .var_type()
                        .map(|t| t.is_array())
                        .unwrap_or(false);
                    if is_array {
                        Some(base.clone())
                    } else {
                        None
                    }
                }
                _ => None,
            },
            _ => None,
        };

        if let Some(base) = base {
            *expr = len_call(base);
        }
    }
}

// ---------------------------------------------------------------------------
// rule 2: System.out/System.err print calls -> fmt

struct SysFileRule;

impl RewriteRule for SysFileRule {
    fn name(&self) -> &'static str {
        "sysfile"
    }

    fn rewrite_expr(&self, ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, expr: &mut Expr) {
        let mc = match expr {
            Expr::Call(mc) if matches!(mc.recv, CallRecv::None) => mc,
            _ => return,
        };

        let (class_name, method_name) = {
            let mb = mc.method.borrow();
            (mb.class_name().unwrap_or_default(), mb.name())
        };

        if !class_name.starts_with("System.") || !method_name.starts_with("print") {
            return;
        }

        let _ = ctx.fmt_class();

        let fixed;
        if class_name.ends_with(".out") {
            fixed = crate::modifiers::upper_initial(&method_name);
        } else {
            fixed = format!("F{}", method_name);
            mc.args.args.insert(
                0,
                Expr::PkgName {
                    pkg: "os".to_string(),
                    name: "Stderr".to_string(),
                },
            );
            ctx.add_import("os");
        }

        mc.method = fake_method(Some("fmt"), &fixed, None);
    }
}

// ---------------------------------------------------------------------------
// rule 3: func main(args []string) -> func main() + os.Args

struct MainArgsRule;

impl RewriteRule for MainArgsRule {
    fn name(&self) -> &'static str {
        "main-args"
    }

    fn rewrite_method(&self, ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, method: &MethodRc) {
        let param = {
            let mb = method.borrow();
            match &*mb {
                Method::Class(cm) if cm.kind == MethodKind::Main && cm.params.len() == 1 => {
                    let p = cm.params[0].clone();
                    let used = cm
                        .body
                        .as_ref()
                        .map(|b| b.has_variable(&p))
                        .unwrap_or(false);
                    Some((p, used))
                }
                _ => None,
            }
        };

        let (param, used) = match param {
            Some(p) => p,
            None => return,
        };

        if used {
            param.borrow_mut().set_go_name("os.Args");
            ctx.add_import("os");
        }

        if let Method::Class(cm) = &mut *method.borrow_mut() {
            cm.params.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// rule 4: foo(this) -> foo(rcvr)

struct ThisArgRule;

impl RewriteRule for ThisArgRule {
    fn name(&self) -> &'static str {
        "this-arg"
    }

    fn rewrite_expr(&self, ctx: &mut RewriteCtx, cls: Option<&ClassRc>, expr: &mut Expr) {
        let mc = match expr {
            Expr::Call(mc) => mc,
            _ => return,
        };

        let class_name = cls.map(|c| c.borrow().name()).unwrap_or_default();
        for arg in &mut mc.args.args {
            if matches!(arg, Expr::Keyword(Keyword::This)) {
                let receiver = ctx.receiver(&class_name);
                *arg = Expr::Var(fake_var(&receiver, 0));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// rule 5: List method calls -> slice operations

struct ListMethodsRule;

enum ListAction {
    Add,
    IsEmpty,
    Get,
    Size,
    Alloc,
}

fn list_var(mc: &MethodCall) -> Option<Var> {
    let v = match &mc.recv {
        CallRecv::Var(v) => v,
        _ => return None,
    };

    let is_list = v
        .borrow()
        .var_type()
        .map(|t| LIST_CLASSES.iter().any(|n| t.is_class(n)))
        .unwrap_or(false);

    if is_list {
        Some(v.clone())
    } else {
        None
    }
}

impl RewriteRule for ListMethodsRule {
    fn name(&self) -> &'static str {
        "list-methods"
    }

    fn rewrite_expr(&self, _ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, expr: &mut Expr) {
        let action = match expr {
            Expr::Call(mc) => match list_var(mc) {
                None => return,
                Some(v) => {
                    let name = mc.method.borrow().name();
                    let nargs = mc.args.len();
                    match (name.as_str(), nargs) {
                        ("add", 1) => Some((v, ListAction::Add)),
                        ("isEmpty", 0) => Some((v, ListAction::IsEmpty)),
                        ("get", 1) => Some((v, ListAction::Get)),
                        ("size", _) => Some((v, ListAction::Size)),
                        (other, n) => {
                            warn!("Not converting list method {} with {} args", other, n);
                            None
                        }
                    }
                }
            },
            Expr::ClassAlloc(alloc) => {
                let name = alloc.class.borrow().name();
                if LIST_CLASSES.contains(&name.as_str()) {
                    Some((fake_var("", 0), ListAction::Alloc))
                } else {
                    None
                }
            }
            _ => return,
        };

        let (v, action) = match action {
            Some(a) => a,
            None => return,
        };

        match action {
            ListAction::Alloc => {
                // allocations become empty slices so the local is
                // slice-typed; element types are not inferred
                *expr = Expr::ArrayInit {
                    ty: Arc::new(TypeData::Array {
                        elem: Some(typedata::generic_object()),
                        dims: 1,
                    }),
                    elems: vec![],
                };
            }
            ListAction::Add => {
                let old = std::mem::replace(expr, Expr::literal("0"));
                let arg = match old {
                    Expr::Call(mut mc) => mc.args.args.pop().expect("add() without argument"),
                    _ => unreachable!(),
                };

                let append = Expr::Call(MethodCall {
                    recv: CallRecv::None,
                    method: fake_method(None, "append", v.borrow().var_type()),
                    args: Args::new(vec![Expr::Var(v.clone()), arg]),
                });

                *expr = Expr::Assign(Box::new(Assign {
                    lhs: v,
                    op: AssignOp::Assign,
                    rhs: vec![append],
                }));
            }
            ListAction::IsEmpty => {
                *expr = Expr::Binary {
                    x: Box::new(len_call(v)),
                    op: BinOp::Eql,
                    y: Box::new(Expr::literal("0")),
                    unsigned: false,
                };
            }
            ListAction::Get => {
                let old = std::mem::replace(expr, Expr::literal("0"));
                let index = match old {
                    Expr::Call(mut mc) => mc.args.args.pop().expect("get() without argument"),
                    _ => unreachable!(),
                };
                *expr = Expr::Var(new_var(VarKind::Index(ArrayIndex {
                    base: Some(v),
                    obj: None,
                    index: Box::new(index),
                })));
            }
            ListAction::Size => {
                *expr = len_call(v);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// rule 6: toString(x) -> fmt.Sprintf("%v", x)

struct ToStringRule;

impl RewriteRule for ToStringRule {
    fn name(&self) -> &'static str {
        "to-string"
    }

    fn rewrite_expr(&self, ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, expr: &mut Expr) {
        let applies = match expr {
            Expr::Call(mc) if matches!(mc.recv, CallRecv::None) => {
                mc.method.borrow().name() == "toString" && mc.args.len() == 1
            }
            _ => false,
        };
        if !applies {
            return;
        }

        let old = std::mem::replace(expr, Expr::literal("0"));
        let arg = match old {
            Expr::Call(mut mc) => mc.args.args.pop().unwrap(),
            _ => unreachable!(),
        };

        let sprintf = sprintf_method(ctx);
        *expr = Expr::Call(MethodCall {
            recv: CallRecv::None,
            method: sprintf,
            args: Args::new(vec![Expr::literal("\"%v\""), arg]),
        });
    }
}

// ---------------------------------------------------------------------------
// rule 7: string + -> fmt.Sprintf (with literal folding)

struct StringAdditionRule;

fn join_strings(s1: &str, s2: &str) -> String {
    let a = s1.trim_start_matches('"').trim_end_matches('"');
    let b = s2.trim_start_matches('"').trim_end_matches('"');
    format!("\"{}{}\"", a, b)
}

fn is_sprintf_call(e: &Expr) -> bool {
    match e {
        Expr::Call(mc) => {
            let mb = mc.method.borrow();
            mb.name() == "Sprintf"
                && mb.var_type().map(|t| t.is_string()).unwrap_or(false)
        }
        _ => false,
    }
}

impl RewriteRule for StringAdditionRule {
    fn name(&self) -> &'static str {
        "string-addition"
    }

    fn rewrite_expr(&self, ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, expr: &mut Expr) {
        let applies = match expr {
            Expr::Binary {
                x,
                op: BinOp::Add,
                ..
            } => x.var_type().map(|t| t.is_string()).unwrap_or(false),
            _ => false,
        };
        if !applies {
            return;
        }

        let old = std::mem::replace(expr, Expr::literal("0"));
        let (x, y) = match old {
            Expr::Binary { x, y, .. } => (*x, *y),
            _ => unreachable!(),
        };

        // literal + literal folds into one literal
        if let (Expr::Literal(lx), Expr::Literal(ly)) = (&x, &y) {
            if lx.is_string() && ly.is_string() {
                *expr = Expr::Literal(Literal::new(join_strings(&lx.text, &ly.text)));
                return;
            }
        }

        // an Sprintf on the left is extended in place
        if is_sprintf_call(&x) {
            let mut mc = match x {
                Expr::Call(mc) => mc,
                _ => unreachable!(),
            };

            let joined = match mc.args.args.first() {
                Some(Expr::Literal(fmtstr)) if fmtstr.is_string() => {
                    Some(join_strings("\"%v\"", &fmtstr.text))
                }
                _ => None,
            };

            match joined {
                Some(joined) => {
                    mc.args.args[0] = Expr::Literal(Literal::new(joined));
                    mc.args.args.push(y);
                    *expr = Expr::Call(mc);
                }
                None => {
                    warn!("First Sprintf argument is not a string literal");
                    *expr = Expr::Binary {
                        x: Box::new(Expr::Call(mc)),
                        op: BinOp::Add,
                        y: Box::new(y),
                        unsigned: false,
                    };
                }
            }
            return;
        }

        let sprintf = sprintf_method(ctx);
        *expr = Expr::Call(MethodCall {
            recv: CallRecv::None,
            method: sprintf,
            args: Args::new(vec![Expr::literal("\"%v%v\""), x, y]),
        });
    }
}

// ---------------------------------------------------------------------------
// rule 8: String.format -> fmt.Sprintf

struct StringFormatRule;

impl RewriteRule for StringFormatRule {
    fn name(&self) -> &'static str {
        "string-format"
    }

    fn rewrite_method(&self, ctx: &mut RewriteCtx, _cls: Option<&ClassRc>, method: &MethodRc) {
        let applies = {
            let mb = method.borrow();
            mb.is_unresolved_reference()
                && mb.name() == "format"
                && mb.class_name().as_deref() == Some("String")
        };
        if !applies {
            return;
        }

        let _ = ctx.fmt_class();

        if let Method::Reference(r) = &mut *method.borrow_mut() {
            r.class_name = Some("fmt".to_string());
            r.name = "Sprintf".to_string();
            r.go_name = "Sprintf".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Unimplemented, VarData};
    use std::cell::RefCell;

    fn data_var(name: &str, ty: Option<Arc<TypeData>>) -> Var {
        Rc::new(RefCell::new(VarKind::Data(VarData {
            receiver: String::new(),
            name: name.to_string(),
            go_name: name.to_string(),
            var_type: ty,
            class_field: false,
            is_static: false,
            is_final: false,
        })))
    }

    fn ctx_parts() -> (ImportSet, FxHashMap<String, ClassRc>, Config) {
        (ImportSet::default(), FxHashMap::default(), Config::default())
    }

    #[test]
    fn array_len_rewrites_attribute() {
        let (mut imports, mut classes, config) = ctx_parts();
        let mut ctx = RewriteCtx {
            imports: &mut imports,
            classes: &mut classes,
            config: &config,
            package: "main",
            java_package: "",
        };

        let base = data_var("args", Some(crate::typedata::classify_primitive("String", 1).unwrap()));
        let mut expr = Expr::Var(Rc::new(RefCell::new(VarKind::Attribute {
            base,
            suffix: "length".to_string(),
        })));

        rewrite_expr_node(&mut expr, &ArrayLenRule, &mut ctx, None);

        match &expr {
            Expr::Call(mc) => {
                assert_eq!(mc.method.borrow().go_name(), "len");
                assert_eq!(mc.args.len(), 1);
            }
            other => panic!("expected len() call, got {:?}", other),
        }

        // idempotent: a second pass leaves the call alone
        rewrite_expr_node(&mut expr, &ArrayLenRule, &mut ctx, None);
        assert!(matches!(&expr, Expr::Call(_)));
    }

    #[test]
    fn string_addition_folds_literals() {
        let (mut imports, mut classes, config) = ctx_parts();
        let mut ctx = RewriteCtx {
            imports: &mut imports,
            classes: &mut classes,
            config: &config,
            package: "main",
            java_package: "",
        };

        let mut expr = Expr::Binary {
            x: Box::new(Expr::literal("\"a\"")),
            op: BinOp::Add,
            y: Box::new(Expr::literal("\"b\"")),
            unsigned: false,
        };

        rewrite_expr_node(&mut expr, &StringAdditionRule, &mut ctx, None);

        match &expr {
            Expr::Literal(l) => assert_eq!(l.text, "\"ab\""),
            other => panic!("expected folded literal, got {:?}", other),
        }
    }

    #[test]
    fn string_addition_extends_sprintf() {
        let (mut imports, mut classes, config) = ctx_parts();
        let mut ctx = RewriteCtx {
            imports: &mut imports,
            classes: &mut classes,
            config: &config,
            package: "main",
            java_package: "",
        };

        // "x=" + x + "," lowered shape: (("x=" + x) + ",")
        let x_var = data_var("x", None);
        let mut expr = Expr::Binary {
            x: Box::new(Expr::Binary {
                x: Box::new(Expr::literal("\"x=\"")),
                op: BinOp::Add,
                y: Box::new(Expr::Var(x_var)),
                unsigned: false,
            }),
            op: BinOp::Add,
            y: Box::new(Expr::literal("\",\"")),
            unsigned: false,
        };

        rewrite_expr_node(&mut expr, &StringAdditionRule, &mut ctx, None);

        match &expr {
            Expr::Call(mc) => {
                assert_eq!(mc.method.borrow().go_name(), "Sprintf");
                assert_eq!(mc.args.len(), 4);
                match &mc.args.args[0] {
                    Expr::Literal(l) => assert_eq!(l.text, "\"%v%v%v\""),
                    other => panic!("expected format literal, got {:?}", other),
                }
            }
            other => panic!("expected Sprintf call, got {:?}", other),
        }
    }

    #[test]
    fn list_alloc_becomes_empty_slice() {
        let (mut imports, mut classes, config) = ctx_parts();
        let mut ctx = RewriteCtx {
            imports: &mut imports,
            classes: &mut classes,
            config: &config,
            package: "main",
            java_package: "",
        };

        let cls = new_class(Class::Ref(crate::model::ClassReference {
            name: "ArrayList".to_string(),
            parent_key: None,
            methods: Default::default(),
        }));
        let ctor = fake_method(None, "NewArrayList", None);
        let mut expr = Expr::ClassAlloc(crate::model::ClassAlloc {
            class: cls,
            method: ctor,
            args: vec![],
        });

        rewrite_expr_node(&mut expr, &ListMethodsRule, &mut ctx, None);

        match &expr {
            Expr::ArrayInit { elems, .. } => assert!(elems.is_empty()),
            other => panic!("expected empty slice literal, got {:?}", other),
        }
    }

    #[test]
    fn unimplemented_nodes_survive_rules() {
        let (mut imports, mut classes, config) = ctx_parts();
        let mut ctx = RewriteCtx {
            imports: &mut imports,
            classes: &mut classes,
            config: &config,
            package: "main",
            java_package: "",
        };

        let mut expr = Expr::Unimplemented(Unimplemented::new("expr", "conditional"));
        for rule in standard_rules() {
            rewrite_expr_node(&mut expr, rule.as_ref(), &mut ctx, None);
        }
        assert!(matches!(expr, Expr::Unimplemented(_)));
    }
}

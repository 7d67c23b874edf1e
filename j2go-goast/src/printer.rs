//! Source printer for the Go syntax tree.
//!
//! Produces gofmt-shaped output: tab indentation, one statement per line,
//! blank lines between top-level declarations and parentheses only where
//! operator precedence demands them.

use std::fmt::Write;

use crate::ast::{Block, CaseClause, Decl, Expr, Field, File, FuncType, Stmt, ValueSpec};
use crate::token::UnOp;

/// Render a complete source file.
pub fn print_file(file: &File) -> String {
    let mut p = Printer::new();
    p.write(&format!("package {}\n", file.package));
    for decl in &file.decls {
        p.write("\n");
        p.decl(decl);
    }
    p.out
}

/// Render a single expression (used by dump/debug output and tests).
pub fn print_expr(expr: &Expr) -> String {
    let mut p = Printer::new();
    p.expr(expr);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Printer {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Import { path } => {
                self.write(&format!("import \"{}\"\n", path));
            }
            Decl::Const { specs } => self.value_decl("const", specs),
            Decl::Var { specs } => self.value_decl("var", specs),
            Decl::Type { name, ty } => {
                self.write(&format!("type {} ", name));
                self.type_expr(ty);
                self.write("\n");
            }
            Decl::Func {
                name,
                recv,
                ftype,
                body,
            } => {
                self.write("func ");
                if let Some(r) = recv {
                    self.write("(");
                    self.field(r);
                    self.write(") ");
                }
                self.write(name);
                self.signature(ftype);
                match body {
                    Some(b) => {
                        self.write(" ");
                        self.block(b);
                        self.write("\n");
                    }
                    None => self.write("\n"),
                }
            }
        }
    }

    fn value_decl(&mut self, kw: &str, specs: &[ValueSpec]) {
        if specs.len() == 1 {
            self.write(kw);
            self.write(" ");
            self.value_spec(&specs[0]);
            self.write("\n");
            return;
        }

        self.write(kw);
        self.write(" (\n");
        self.indent += 1;
        for spec in specs {
            self.line_start();
            self.value_spec(spec);
            self.write("\n");
        }
        self.indent -= 1;
        self.line_start();
        self.write(")\n");
    }

    fn value_spec(&mut self, spec: &ValueSpec) {
        self.write(&spec.names.join(", "));
        if let Some(ty) = &spec.ty {
            self.write(" ");
            self.type_expr(ty);
        }
        if !spec.values.is_empty() {
            self.write(" = ");
            for (i, v) in spec.values.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.expr(v);
            }
        }
    }

    fn signature(&mut self, ftype: &FuncType) {
        self.write("(");
        self.field_list(&ftype.params);
        self.write(")");
        match ftype.results.len() {
            0 => {}
            1 if ftype.results[0].names.is_empty() => {
                self.write(" ");
                self.type_expr(&ftype.results[0].ty);
            }
            _ => {
                self.write(" (");
                self.field_list(&ftype.results);
                self.write(")");
            }
        }
    }

    fn field_list(&mut self, fields: &[Field]) {
        for (i, f) in fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.field(f);
        }
    }

    fn field(&mut self, f: &Field) {
        if !f.names.is_empty() {
            self.write(&f.names.join(", "));
            self.write(" ");
        }
        self.type_expr(&f.ty);
    }

    fn block(&mut self, block: &Block) {
        self.write("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.write("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Empty = stmt {
            return;
        }
        self.line_start();
        self.stmt_inline(stmt);
        self.write("\n");
    }

    /// Print a statement without leading indent or trailing newline, for
    /// use inside `if init;` and `for` headers as well as normal lines.
    fn stmt_inline(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => self.expr(e),
            Stmt::Assign { lhs, op, rhs } => {
                for (i, e) in lhs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(e);
                }
                self.write(&format!(" {} ", op.as_str()));
                for (i, e) in rhs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(e);
                }
            }
            Stmt::IncDec { x, dec } => {
                self.expr(x);
                self.write(if *dec { "--" } else { "++" });
            }
            Stmt::Return(exprs) => {
                self.write("return");
                for (i, e) in exprs.iter().enumerate() {
                    self.write(if i == 0 { " " } else { ", " });
                    self.expr(e);
                }
            }
            Stmt::Branch { tok, label } => {
                self.write(tok.as_str());
                if let Some(l) = label {
                    self.write(" ");
                    self.write(l);
                }
            }
            Stmt::Labeled { label, stmt } => {
                self.write(label);
                self.write(":\n");
                self.line_start();
                self.stmt_inline(stmt);
            }
            Stmt::If {
                init,
                cond,
                body,
                els,
            } => {
                self.write("if ");
                if let Some(init) = init {
                    self.stmt_inline(init);
                    self.write("; ");
                }
                self.expr(cond);
                self.write(" ");
                self.block(body);
                if let Some(els) = els {
                    self.write(" else ");
                    match els.as_ref() {
                        Stmt::If { .. } => self.stmt_inline(els),
                        Stmt::Block(b) => self.block(b),
                        other => {
                            let b = Block::new(vec![other.clone()]);
                            self.block(&b);
                        }
                    }
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.write("for ");
                if init.is_none() && post.is_none() {
                    if let Some(c) = cond {
                        self.expr(c);
                        self.write(" ");
                    }
                } else {
                    if let Some(init) = init {
                        self.stmt_inline(init);
                    }
                    self.write("; ");
                    if let Some(c) = cond {
                        self.expr(c);
                    }
                    self.write("; ");
                    if let Some(post) = post {
                        self.stmt_inline(post);
                    }
                    self.write(" ");
                }
                self.block(body);
            }
            Stmt::Range { key, value, x, body } => {
                self.write(&format!("for {}, {} := range ", key, value));
                self.expr(x);
                self.write(" ");
                self.block(body);
            }
            Stmt::Switch { tag, cases } => {
                self.write("switch ");
                self.expr(tag);
                self.write(" {\n");
                for case in cases {
                    self.case_clause(case);
                }
                self.line_start();
                self.write("}");
            }
            Stmt::Block(b) => self.block(b),
            Stmt::Decl(d) => match d {
                Decl::Var { specs } if specs.len() == 1 => {
                    self.write("var ");
                    self.value_spec(&specs[0]);
                }
                other => self.decl_inline(other),
            },
            Stmt::Empty => {}
        }
    }

    fn decl_inline(&mut self, decl: &Decl) {
        // Trim the trailing newline a top-level rendering would add.
        let mut p = Printer {
            out: String::new(),
            indent: self.indent,
        };
        p.decl(decl);
        self.write(p.out.trim_end_matches('\n'));
    }

    fn case_clause(&mut self, case: &CaseClause) {
        self.line_start();
        if case.exprs.is_empty() {
            self.write("default:\n");
        } else {
            self.write("case ");
            for (i, e) in case.exprs.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.expr(e);
            }
            self.write(":\n");
        }
        self.indent += 1;
        for stmt in &case.body {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn expr(&mut self, expr: &Expr) {
        self.expr_prec(expr, 0);
    }

    /// Print `expr`, parenthesizing when it binds looser than the context.
    fn expr_prec(&mut self, expr: &Expr, min_prec: u8) {
        let prec = precedence(expr);
        if prec < min_prec {
            self.write("(");
            self.expr_prec(expr, 0);
            self.write(")");
            return;
        }

        match expr {
            Expr::Ident(name) => self.write(name),
            Expr::BasicLit(text) => self.write(text),
            Expr::Selector { x, sel } => {
                self.expr_prec(x, PRIMARY);
                self.write(".");
                self.write(sel);
            }
            Expr::Star(x) => {
                self.write("*");
                self.type_expr(x);
            }
            Expr::Unary { op, x } => {
                self.write(op.as_str());
                // -(-x) must not collapse into --x
                if let (UnOp::Sub, Expr::Unary { op: UnOp::Sub, .. }) = (op, x.as_ref()) {
                    self.write("(");
                    self.expr(x);
                    self.write(")");
                } else {
                    self.expr_prec(x, UNARY);
                }
            }
            Expr::Binary { x, op, y } => {
                let p = op.precedence();
                self.expr_prec(x, p);
                self.write(&format!(" {} ", op.as_str()));
                self.expr_prec(y, p + 1);
            }
            Expr::Paren(x) => {
                self.write("(");
                self.expr(x);
                self.write(")");
            }
            Expr::Call { fun, args } => {
                self.expr_prec(fun, PRIMARY);
                self.write("(");
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(a);
                }
                self.write(")");
            }
            Expr::Index { x, index } => {
                self.expr_prec(x, PRIMARY);
                self.write("[");
                self.expr(index);
                self.write("]");
            }
            Expr::TypeAssert { x, ty } => {
                self.expr_prec(x, PRIMARY);
                self.write(".(");
                self.type_expr(ty);
                self.write(")");
            }
            Expr::Composite { ty, elts } => {
                if let Some(ty) = ty {
                    self.type_expr(ty);
                }
                self.write("{");
                for (i, e) in elts.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.expr(e);
                }
                self.write("}");
            }
            Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::EmptyInterface
            | Expr::StructType(_)
            | Expr::InterfaceType(_) => self.type_expr(expr),
        }
    }

    fn type_expr(&mut self, ty: &Expr) {
        match ty {
            Expr::ArrayType { elt } => {
                self.write("[]");
                self.type_expr(elt);
            }
            Expr::MapType { key, value } => {
                self.write("map[");
                self.type_expr(key);
                self.write("]");
                self.type_expr(value);
            }
            Expr::EmptyInterface => self.write("interface{}"),
            Expr::Star(x) => {
                self.write("*");
                self.type_expr(x);
            }
            Expr::StructType(fields) => {
                if fields.is_empty() {
                    self.write("struct{}");
                    return;
                }
                self.write("struct {\n");
                self.indent += 1;
                for f in fields {
                    self.line_start();
                    self.field(f);
                    self.write("\n");
                }
                self.indent -= 1;
                self.line_start();
                self.write("}");
            }
            Expr::InterfaceType(methods) => {
                if methods.is_empty() {
                    self.write("interface{}");
                    return;
                }
                self.write("interface {\n");
                self.indent += 1;
                for (name, ftype) in methods {
                    self.line_start();
                    self.write(name);
                    self.signature(ftype);
                    self.write("\n");
                }
                self.indent -= 1;
                self.line_start();
                self.write("}");
            }
            other => self.expr(other),
        }
    }
}

const UNARY: u8 = 6;
const PRIMARY: u8 = 7;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => UNARY,
        _ => PRIMARY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{AssignOp, BinOp, Branch};

    fn bin(x: Expr, op: BinOp, y: Expr) -> Expr {
        Expr::Binary {
            x: Box::new(x),
            op,
            y: Box::new(y),
        }
    }

    #[test]
    fn binary_precedence_parens() {
        // (a + b) * c keeps its grouping, a + b * c does not gain parens
        let grouped = bin(
            bin(Expr::ident("a"), BinOp::Add, Expr::ident("b")),
            BinOp::Mul,
            Expr::ident("c"),
        );
        assert_eq!(print_expr(&grouped), "(a + b) * c");

        let natural = bin(
            Expr::ident("a"),
            BinOp::Add,
            bin(Expr::ident("b"), BinOp::Mul, Expr::ident("c")),
        );
        assert_eq!(print_expr(&natural), "a + b * c");
    }

    #[test]
    fn left_assoc_right_child_parens() {
        // a - (b - c) needs parens on the right
        let e = bin(
            Expr::ident("a"),
            BinOp::Sub,
            bin(Expr::ident("b"), BinOp::Sub, Expr::ident("c")),
        );
        assert_eq!(print_expr(&e), "a - (b - c)");
    }

    #[test]
    fn unary_over_binary() {
        let e = Expr::Unary {
            op: UnOp::Not,
            x: Box::new(bin(Expr::ident("a"), BinOp::LAnd, Expr::ident("b"))),
        };
        assert_eq!(print_expr(&e), "!(a && b)");
    }

    #[test]
    fn selector_call_index() {
        let e = Expr::call(
            Expr::selector(Expr::ident("fmt"), "Println"),
            vec![Expr::Index {
                x: Box::new(Expr::selector(Expr::ident("os"), "Args")),
                index: Box::new(Expr::ident("i")),
            }],
        );
        assert_eq!(print_expr(&e), "fmt.Println(os.Args[i])");
    }

    #[test]
    fn type_rendering() {
        let slice = Expr::ArrayType {
            elt: Box::new(Expr::Star(Box::new(Expr::ident("Foo")))),
        };
        assert_eq!(print_expr(&slice), "[]*Foo");

        let m = Expr::MapType {
            key: Box::new(Expr::ident("string")),
            value: Box::new(Expr::EmptyInterface),
        };
        assert_eq!(print_expr(&m), "map[string]interface{}");
    }

    #[test]
    fn func_decl_output() {
        let file = File {
            package: "main".into(),
            decls: vec![Decl::Func {
                name: "GetVal".into(),
                recv: Some(Field::named(
                    "rcvr",
                    Expr::Star(Box::new(Expr::ident("foo"))),
                )),
                ftype: FuncType {
                    params: vec![],
                    results: vec![Field::anon(Expr::ident("int"))],
                },
                body: Some(Block::new(vec![Stmt::Return(vec![Expr::selector(
                    Expr::ident("rcvr"),
                    "val",
                )])])),
            }],
        };
        let out = print_file(&file);
        assert!(out.contains("package main\n"));
        assert!(out.contains("func (rcvr *foo) GetVal() int {\n\treturn rcvr.val\n}\n"));
    }

    #[test]
    fn struct_decl_output() {
        let file = File {
            package: "main".into(),
            decls: vec![Decl::Type {
                name: "foo".into(),
                ty: Expr::StructType(vec![Field::named("val", Expr::ident("int"))]),
            }],
        };
        assert!(print_file(&file).contains("type foo struct {\n\tval int\n}\n"));
    }

    #[test]
    fn switch_with_fallthrough() {
        let sw = Stmt::Switch {
            tag: Expr::ident("x"),
            cases: vec![
                CaseClause {
                    exprs: vec![Expr::BasicLit("1".into())],
                    body: vec![Stmt::Branch {
                        tok: Branch::Fallthrough,
                        label: None,
                    }],
                },
                CaseClause {
                    exprs: vec![],
                    body: vec![],
                },
            ],
        };
        let file = File {
            package: "main".into(),
            decls: vec![Decl::Func {
                name: "main".into(),
                recv: None,
                ftype: FuncType::default(),
                body: Some(Block::new(vec![sw])),
            }],
        };
        let out = print_file(&file);
        assert!(out.contains("switch x {\n\tcase 1:\n\t\tfallthrough\n\tdefault:\n\t}"));
    }

    #[test]
    fn comma_ok_assert() {
        let stmt = Stmt::Assign {
            lhs: vec![Expr::ident("f"), Expr::ident("ok")],
            op: AssignOp::Define,
            rhs: vec![Expr::TypeAssert {
                x: Box::new(Expr::ident("obj")),
                ty: Box::new(Expr::Star(Box::new(Expr::ident("Foo")))),
            }],
        };
        let mut p = Printer::new();
        p.stmt_inline(&stmt);
        assert_eq!(p.out, "f, ok := obj.(*Foo)");
    }
}

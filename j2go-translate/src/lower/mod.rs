//! The lowering engine: walk the tree-sitter Java syntax tree and build
//! the Go program model.
//!
//! Dispatch is by `node.kind()`. Constructs with no mapping produce a
//! diagnostic plus an `<<unimp_...>>` placeholder and lowering continues;
//! impossible combinations abort the file with [`TranslateError`].

mod decls;
mod exprs;
mod stmts;

use std::sync::Arc;

use tree_sitter::{LogType, Node, Parser, Tree};

use crate::config::Config;
use crate::model::{new_class, Class, ClassRc, Program};
use crate::name::TypeName;
use crate::scope::Scope;
use crate::typedata::{classify_object, classify_primitive, TypeData};
use crate::{Result, TranslateError};

/// Front end for translating one source file at a time.
pub struct Translator {
    pub config: Arc<Config>,
    pub verbose: bool,
    pub debug: bool,
    pub debug_lex: bool,
}

impl Translator {
    pub fn new(config: Arc<Config>) -> Translator {
        Translator {
            config,
            verbose: false,
            debug: false,
            debug_lex: false,
        }
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| TranslateError::invariant(format!("Failed to set Java language: {}", e)))?;

        if self.debug || self.debug_lex {
            let debug = self.debug;
            let debug_lex = self.debug_lex;
            parser.set_logger(Some(Box::new(move |log_type, message| match log_type {
                LogType::Parse if debug => eprintln!("parse: {}", message),
                LogType::Lex if debug_lex => eprintln!("lex: {}", message),
                _ => {}
            })));
        }

        Ok(parser)
    }

    fn parse(&self, file: &str, source: &str) -> Result<Tree> {
        let mut parser = self.parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            TranslateError::invariant(format!("Parser produced no tree for {}", file))
        })?;

        if tree.root_node().has_error() {
            if let Some(bad) = first_error(tree.root_node()) {
                let pos = bad.start_position();
                return Err(TranslateError::Parse {
                    file: file.to_string(),
                    line: pos.row + 1,
                    column: pos.column + 1,
                    message: format!("unexpected {}", bad.kind()),
                });
            }
        }

        Ok(tree)
    }

    /// The parse tree in s-expression form, for report mode.
    pub fn parse_sexp(&self, file: &str, source: &str) -> Result<String> {
        Ok(self.parse(file, source)?.root_node().to_sexp())
    }

    /// Translate one Java source into a program model. The rewrite
    /// pipeline is a separate step; see [`crate::rewrite`].
    pub fn translate_source(&self, out_name: &str, file: &str, source: &str) -> Result<Program> {
        let tree = self.parse(file, source)?;

        let mut lowerer = Lowerer {
            src: source.as_bytes(),
            program: Program::new(out_name, self.config.clone(), self.verbose),
            nil_owner: new_class(Class::Nil),
        };

        lowerer.lower_file(tree.root_node())?;
        lowerer.program.finalize();

        Ok(lowerer.program)
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }

    None
}

/// Per-file lowering state: the source bytes and the program being built.
pub(crate) struct Lowerer<'s> {
    pub src: &'s [u8],
    pub program: Program,
    pub nil_owner: ClassRc,
}

impl<'s> Lowerer<'s> {
    pub fn text(&self, node: Node) -> &str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn lower_file(&mut self, root: Node) -> Result<()> {
        let scope = Scope::root();

        // package and imports first; they feed type classification
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    let name = child
                        .named_children(&mut child.walk())
                        .find(|n| matches!(n.kind(), "identifier" | "scoped_identifier"))
                        .map(|n| self.text(n).to_string());
                    self.program.set_package(name.as_deref());
                }
                "import_declaration" => self.lower_import(child),
                _ => {}
            }
        }

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" | "import_declaration" => {}
                "class_declaration" => decls::lower_class_decl(self, &scope, None, child)?,
                "interface_declaration" => decls::lower_interface_decl(self, child)?,
                "enum_declaration" => decls::lower_enum_decl(self, child),
                "line_comment" | "block_comment" => {}
                other => {
                    tracing::warn!("Ignoring unknown top-level declaration {}", other);
                }
            }
        }

        Ok(())
    }

    fn lower_import(&mut self, node: Node) {
        let name = match node
            .named_children(&mut node.walk())
            .find(|n| matches!(n.kind(), "identifier" | "scoped_identifier"))
        {
            Some(n) => TypeName::new(self.text(n)),
            None => return,
        };

        let pkg = name.package_string();
        match self.program.config.find_package(&pkg) {
            Some(mapped) => {
                self.program.add_import(&mapped, Some(name.last_type()));
            }
            None => {
                // no mapping: keep a fake owner around for dispatch
                let fake = new_class(Class::Fake(crate::model::FakeClass {
                    name: name.last_type().to_string(),
                    package: Some(pkg),
                    methods: Default::default(),
                }));
                self.program.add_class(fake);
                tracing::info!("Faking import for {}", name);
            }
        }
    }

    /// Split a type node into its base name and array dimension count,
    /// warning about (and erasing) generic type arguments.
    pub fn type_info(&self, node: Node) -> (TypeName, usize) {
        match node.kind() {
            "array_type" => {
                let elem = node.child_by_field_name("element");
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(|d| self.text(d).matches('[').count())
                    .unwrap_or(1);
                match elem {
                    Some(e) => {
                        let (name, inner) = self.type_info(e);
                        (name, inner + dims)
                    }
                    None => (TypeName::new("Object"), dims),
                }
            }
            "generic_type" => {
                tracing::warn!("Ignoring generic type arguments in {}", self.text(node));
                let base = node
                    .named_children(&mut node.walk())
                    .find(|n| n.kind() != "type_arguments");
                match base {
                    Some(b) => self.type_info(b),
                    None => (TypeName::new(self.text(node)), 0),
                }
            }
            _ => (TypeName::new(self.text(node).trim()), 0),
        }
    }

    /// Classify a Java type name into TypeData.
    pub fn create_type_data(&self, name: &TypeName, dims: usize) -> Result<Arc<TypeData>> {
        if name.is_primitive() || name.to_string() == "String" {
            return classify_primitive(&name.to_string(), dims);
        }

        Ok(classify_object(&self.program, &name.to_string(), dims))
    }
}

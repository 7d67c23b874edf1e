//! The per-file program model: package, imports, enums, interfaces,
//! classes.

use std::fmt::Write as _;
use std::sync::Arc;

use j2go_goast::ast::{Decl as GoDecl, File as GoFile};
use rustc_hash::FxHashMap;

use super::class::{class_key, finalize_class, Class, ClassRc};
use super::enums::EnumDef;
use super::imports::ImportSet;
use super::interfaces::{new_interface, Interface, InterfaceRc, InterfaceRef};
use crate::config::Config;
use crate::name::TypeName;
use crate::typedata::TypeDict;

pub const DEFAULT_RECEIVER: &str = "rcvr";

/// Everything translated from one Java source file.
#[derive(Debug)]
pub struct Program {
    /// The output file name (`Foo.go`).
    pub name: String,
    pub package: String,
    /// The declared Java package, kept for receiver lookups.
    pub java_package: String,
    pub verbose: bool,
    pub config: Arc<Config>,
    pub imports: ImportSet,
    pub enums: Vec<EnumDef>,
    pub interfaces: Vec<InterfaceRc>,
    pub classes: FxHashMap<String, ClassRc>,
}

impl Program {
    pub fn new(name: &str, config: Arc<Config>, verbose: bool) -> Program {
        Program {
            name: name.to_string(),
            package: "main".to_string(),
            java_package: String::new(),
            verbose,
            config,
            imports: ImportSet::default(),
            enums: Vec::new(),
            interfaces: Vec::new(),
            classes: FxHashMap::default(),
        }
    }

    /// Set the Go package from the Java package declaration, mapping it
    /// through the configuration.
    pub fn set_package(&mut self, java_package: Option<&str>) {
        self.java_package = java_package.unwrap_or("").to_string();
        self.package = match java_package {
            Some(pkg) => self
                .config
                .find_package(pkg)
                .unwrap_or_else(|| pkg.to_string()),
            None => "main".to_string(),
        };
        if self.package.is_empty() {
            self.package = "main".to_string();
        }
    }

    /// The receiver name for a class: the configured override (keyed by
    /// the source-qualified class name), or `rcvr`.
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

    pub fn add_import(&mut self, pkg: &str, class_name: Option<&str>) {
        if pkg == self.package {
            return;
        }
        self.imports.add(pkg, class_name);
    }

    pub fn add_class(&mut self, cls: ClassRc) {
        let key = cls.borrow().key();
        self.classes.insert(key, cls);
    }

    /// Top-level class lookup by simple name.
    pub fn find_class(&self, name: &str) -> Option<ClassRc> {
        self.classes.get(&class_key(None, name)).cloned()
    }

    pub fn add_enum(&mut self, e: EnumDef) {
        self.enums.push(e);
    }

    pub fn find_interface(&self, name: &TypeName) -> Option<InterfaceRc> {
        self.interfaces
            .iter()
            .find(|i| i.borrow().matches(name))
            .cloned()
    }

    pub fn add_interface_reference(&mut self, name: &TypeName) -> InterfaceRc {
        let iface = new_interface(Interface::Ref(InterfaceRef { name: name.clone() }));
        self.interfaces.push(iface.clone());
        iface
    }

    /// Register an interface definition, replacing any reference with the
    /// same name in place.
    pub fn add_interface_definition(&mut self, iface: Interface) -> InterfaceRc {
        let name = TypeName::new(&iface.name());

        for existing in &self.interfaces {
            let replace = {
                let b = existing.borrow();
                b.matches(&name) && matches!(&*b, Interface::Ref(_))
            };
            if replace {
                *existing.borrow_mut() = iface;
                return existing.clone();
            }
        }

        let rc = new_interface(iface);
        self.interfaces.push(rc.clone());
        rc
    }

    /// Post-processing once lowering is complete: bind references, move
    /// field initializers into constructors, renumber overloads.
    pub fn finalize(&mut self) {
        for iface in &self.interfaces {
            iface.borrow_mut().finalize();
        }

        let classes: Vec<ClassRc> = self.sorted_classes();
        for cls in classes {
            let name = cls.borrow().name();
            let receiver = self.receiver(&name);
            finalize_class(&cls, &receiver);
        }
    }

    fn sorted_classes(&self) -> Vec<ClassRc> {
        let mut keys: Vec<&String> = self.classes.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| self.classes[k].clone())
            .collect()
    }

    fn sorted_interfaces(&self) -> Vec<InterfaceRc> {
        let mut ifaces = self.interfaces.clone();
        ifaces.sort_by_key(|i| i.borrow().name());
        ifaces
    }

    /// Assemble the Go file: imports, enums, interfaces, classes.
    pub fn file(&self) -> GoFile {
        let mut decls: Vec<GoDecl> = self.imports.decls();

        let mut enums: Vec<&EnumDef> = self.enums.iter().collect();
        enums.sort_by(|a, b| a.name.cmp(&b.name));
        for e in enums {
            decls.extend(e.decls());
        }

        for iface in self.sorted_interfaces() {
            let ib = iface.borrow();
            decls.extend(ib.constant_decls());
            if let Some(d) = ib.decl() {
                decls.push(d);
            }
        }

        for cls in self.sorted_classes() {
            let cb = cls.borrow();
            decls.extend(cb.constant_decls());
            decls.extend(cb.static_decls());
            decls.extend(cb.decls());
        }

        GoFile {
            package: self.package.clone(),
            decls,
        }
    }

    /// Render the generated Go source.
    pub fn render(&self) -> String {
        j2go_goast::print_file(&self.file())
    }

    /// A one-screen structural summary, used by report mode.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Program[{}|{}]", self.name, self.package);

        for e in &self.enums {
            let _ = writeln!(out, "  enum {} ({} constants)", e.name, e.constants.len());
        }

        for iface in &self.interfaces {
            let ib = iface.borrow();
            match &*ib {
                Interface::Def(d) => {
                    let _ = writeln!(
                        out,
                        "  interface {} ({} methods, {} constants)",
                        d.name,
                        d.methods.len(),
                        d.constants.len()
                    );
                }
                Interface::Ref(r) => {
                    let _ = writeln!(out, "  interface-ref {}", r.name);
                }
            }
        }

        for cls in self.sorted_classes() {
            let cb = cls.borrow();
            match &*cb {
                Class::Def(d) => {
                    let _ = writeln!(
                        out,
                        "  class {} ({} fields, {} methods)",
                        d.name,
                        d.vars.len(),
                        d.methods.len()
                    );
                    for m in d.methods.all() {
                        let mb = m.borrow();
                        let _ = writeln!(
                            out,
                            "    method {} -> {} ({} params)",
                            mb.name(),
                            mb.go_name(),
                            mb.num_params()
                        );
                    }
                }
                Class::Ref(r) => {
                    let _ = writeln!(out, "  class-ref {}", r.name);
                }
                Class::Fake(f) => {
                    let _ = writeln!(out, "  fake class {}", f.name);
                }
                Class::Nil => {}
            }
        }

        out
    }
}

impl TypeDict for Program {
    fn imported_type(&self, name: &str) -> Option<String> {
        self.imports.imported_type(name)
    }

    fn is_interface(&self, name: &str) -> bool {
        self.config.is_interface(name)
    }
}

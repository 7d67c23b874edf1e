//! Nested name scopes used during lowering.
//!
//! A scope owns its own variable and class maps and points at its parent;
//! lookups walk the parent chain and then fall back to the enclosing
//! class. Scopes never touch their parent's maps.

use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::model::{
    new_class, new_var, Class, ClassRc, Var, VarData, VarKind,
};
use crate::model::{class_key, Program};
use crate::modifiers::{fix_name, Modifiers, MOD_FINAL, MOD_STATIC};
use crate::name::TypeName;
use crate::typedata::TypeData;

pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    class: Option<ClassRc>,
    vars: RefCell<FxHashMap<String, Var>>,
    classes: RefCell<FxHashMap<String, ClassRc>>,
}

impl<'a> Scope<'a> {
    pub fn root() -> Scope<'a> {
        Scope {
            parent: None,
            class: None,
            vars: RefCell::new(FxHashMap::default()),
            classes: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn child(&'a self) -> Scope<'a> {
        Scope {
            parent: Some(self),
            class: None,
            vars: RefCell::new(FxHashMap::default()),
            classes: RefCell::new(FxHashMap::default()),
        }
    }

    /// A child scope that establishes `cls` as the enclosing class.
    pub fn class_child(&'a self, cls: ClassRc) -> Scope<'a> {
        let mut scope = self.child();
        scope.class = Some(cls);
        scope
    }

    /// The nearest enclosing class definition.
    pub fn class(&self) -> Option<ClassRc> {
        if let Some(c) = &self.class {
            return Some(c.clone());
        }
        self.parent.and_then(Scope::class)
    }

    pub fn class_name(&self) -> String {
        self.class()
            .map(|c| c.borrow().name())
            .unwrap_or_default()
    }

    /// The receiver name for the enclosing class.
    pub fn receiver(&self, program: &Program) -> String {
        program.receiver(&self.class_name())
    }

    /// Add a variable to this scope; if the name is already present here,
    /// the existing reference is returned instead.
    pub fn add_variable(
        &self,
        name: &str,
        modifiers: &Modifiers,
        var_type: Option<Arc<TypeData>>,
        class_field: bool,
        receiver: &str,
    ) -> Var {
        if let Some(existing) = self.vars.borrow().get(name) {
            return existing.clone();
        }

        let go_name = fix_name(name, modifiers);
        let var = new_var(VarKind::Data(VarData {
            receiver: if class_field {
                receiver.to_string()
            } else {
                String::new()
            },
            name: name.to_string(),
            go_name,
            var_type,
            class_field,
            is_static: modifiers.is_set(MOD_STATIC),
            is_final: modifiers.is_set(MOD_FINAL),
        }));

        self.vars.borrow_mut().insert(name.to_string(), var.clone());
        var
    }

    /// Look up a (possibly dotted) name. A dotted name resolves its first
    /// segment to a variable and wraps the rest as a class attribute.
    pub fn find_variable(&self, name: &TypeName) -> Option<Var> {
        if let Some(v) = self.find_in_chain(name) {
            return Some(v);
        }

        self.class()
            .and_then(|cls| cls.borrow().find_variable(name))
    }

    fn find_in_chain(&self, name: &TypeName) -> Option<Var> {
        if !name.is_dotted() {
            if let Some(v) = self.vars.borrow().get(&name.to_string()) {
                return Some(v.clone());
            }
        } else if let Some(base) = self.vars.borrow().get(name.first()) {
            return Some(new_var(VarKind::Attribute {
                base: base.clone(),
                suffix: name.not_first().to_string(),
            }));
        }

        self.parent.and_then(|p| p.find_in_chain(name))
    }

    /// Register a class in this scope and on the program. If the key is
    /// already bound to a class *reference*, the reference cell is
    /// fulfilled in place so existing handles now see this class.
    pub fn add_class(&self, program: &mut Program, cls: Class) -> ClassRc {
        let key = cls.key();

        let existing = self.classes.borrow().get(&key).cloned();
        let rc = match existing {
            None => {
                let rc = new_class(cls);
                self.classes.borrow_mut().insert(key, rc.clone());
                rc
            }
            Some(slot) => {
                let pending = {
                    let mut sb = slot.borrow_mut();
                    if !sb.is_reference() {
                        // duplicate definition; keep the first
                        tracing::warn!(
                            "Scope already contains class {} (keeping first)",
                            sb.name()
                        );
                        None
                    } else {
                        let old = std::mem::replace(&mut *sb, cls);
                        match old {
                            Class::Ref(r) => Some(r.methods),
                            _ => None,
                        }
                    }
                };

                // rebind method references accumulated on the old reference
                if let Some(methods) = pending {
                    if let Class::Def(d) = &mut *slot.borrow_mut() {
                        d.methods.absorb(methods);
                    }
                }

                slot.clone()
            }
        };

        // top-level registration so the class is always emitted
        program.add_class(rc.clone());

        rc
    }

    /// Find a class by `(parent, simple-name)` key: this scope, then the
    /// parent chain, then the program.
    pub fn find_class(
        &self,
        program: &Program,
        parent: Option<&str>,
        name: &str,
    ) -> Option<ClassRc> {
        let key = class_key(parent, name);

        if let Some(c) = self.classes.borrow().get(&key) {
            return Some(c.clone());
        }

        if let Some(p) = self.parent {
            return p.find_class(program, parent, name);
        }

        program.find_class(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::typedata::classify_primitive;

    #[test]
    fn shadowing_and_chain_lookup() {
        let outer = Scope::root();
        let mods = Modifiers::default();
        let v1 = outer.add_variable("x", &mods, None, false, "");

        let inner = outer.child();
        // visible through the chain
        assert!(inner
            .find_variable(&TypeName::new("x"))
            .is_some_and(|v| crate::model::var_eq(&v, &v1)));

        // a new declaration in the child shadows without touching the parent
        let v2 = inner.add_variable("x", &mods, None, false, "");
        assert!(!std::rc::Rc::ptr_eq(&v1, &v2));
        assert!(std::rc::Rc::ptr_eq(
            &outer.find_variable(&TypeName::new("x")).unwrap(),
            &v1
        ));
    }

    #[test]
    fn duplicate_in_same_scope_returns_existing() {
        let scope = Scope::root();
        let mods = Modifiers::default();
        let v1 = scope.add_variable("x", &mods, None, false, "");
        let v2 = scope.add_variable("x", &mods, None, false, "");
        assert!(std::rc::Rc::ptr_eq(&v1, &v2));
    }

    #[test]
    fn dotted_lookup_wraps_attribute() {
        let scope = Scope::root();
        let mods = Modifiers::default();
        let td = classify_primitive("int", 1).unwrap();
        scope.add_variable("args", &mods, Some(td), false, "");

        let attr = scope.find_variable(&TypeName::new("args.length")).unwrap();
        assert_eq!(attr.borrow().name(), "args.length");
        assert!(attr.borrow().var_type().unwrap().is_array());
    }

    #[test]
    fn class_reference_fulfilled_in_place() {
        let mut program = Program::new("t.go", Arc::new(Config::default()), false);
        let scope = Scope::root();

        let handle = scope.add_class(
            &mut program,
            Class::Ref(crate::model::ClassReference {
                name: "Foo".to_string(),
                parent_key: None,
                methods: Default::default(),
            }),
        );
        assert!(handle.borrow().is_reference());

        let def = scope.add_class(
            &mut program,
            Class::Def(crate::model::ClassDef::new("Foo", None)),
        );

        // same cell: the old handle now routes to the definition
        assert!(std::rc::Rc::ptr_eq(&handle, &def));
        assert!(!handle.borrow().is_reference());
    }
}

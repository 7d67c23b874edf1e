//! Per-owner method maps: simple name → ordered overload list.
//!
//! Adding a real method binds any forward reference already in the list
//! with the same name and arity. After a class is finalized, duplicate Go
//! names among real overloads are renumbered (`F`, `F2`, `F3`, …).

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::model::{Method, MethodRc};
use crate::typedata::TypeData;

#[derive(Debug, Default)]
pub struct MethodMap {
    methods: FxHashMap<String, Vec<MethodRc>>,
}

impl MethodMap {
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Add a method under its simple name. A real method replaces (and
    /// binds) a matching unresolved reference; a duplicate reference is
    /// dropped from the map (its call site keeps the handle).
    pub fn add_method(&mut self, new_method: MethodRc) {
        let (name, num_params, is_real) = {
            let mb = new_method.borrow();
            let real = matches!(&*mb, Method::Class(_) | Method::Iface(_));
            (mb.name(), mb.num_params(), real)
        };

        if !self.methods.contains_key(&name) {
            self.methods.insert(name, vec![new_method]);
            return;
        }
        let list = self.methods.get_mut(&name).expect("method list exists");

        if !is_real {
            if !matches!(&*new_method.borrow(), Method::Reference(_)) {
                warn!("Unexpected duplicate method kind for {}", name);
            }
            return;
        }

        let mut fixed = false;
        for slot in list.iter_mut() {
            let bindable = {
                let sb = slot.borrow();
                sb.is_method(&name, num_params) && sb.is_unresolved_reference()
            };

            if bindable {
                if let Method::Reference(r) = &mut *slot.borrow_mut() {
                    r.resolved = Some(new_method.clone());
                }
                *slot = new_method.clone();
                fixed = true;
            }
        }

        if !fixed {
            list.push(new_method);
        }
    }

    /// Overload lookup by name and argument-type vector. Deterministic:
    /// the first matching method in declaration order wins.
    pub fn find_method(
        &self,
        name: &str,
        arg_types: &[Option<Arc<TypeData>>],
    ) -> Option<MethodRc> {
        self.methods.get(name).and_then(|list| {
            list.iter()
                .find(|m| m.borrow().has_arguments(arg_types))
                .cloned()
        })
    }

    pub fn list(&self, name: &str) -> &[MethodRc] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.methods.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All methods, grouped by sorted name, declaration order inside each
    /// group.
    pub fn all(&self) -> Vec<MethodRc> {
        let mut out = Vec::new();
        for key in self.sorted_keys() {
            out.extend(self.methods[&key].iter().cloned());
        }
        out
    }

    /// Append a numeric suffix to the second and later real overloads of
    /// each name. Unbound references and fakes keep their names.
    pub fn renumber_duplicates(&mut self) {
        for list in self.methods.values() {
            if list.len() < 2 {
                continue;
            }

            for (n, m) in list.iter().enumerate().skip(1) {
                let is_real = matches!(&*m.borrow(), Method::Class(_) | Method::Iface(_));
                if !is_real {
                    continue;
                }
                let go_name = m.borrow().go_name();
                m.borrow_mut()
                    .set_go_name(&format!("{}{}", go_name, n + 1));
            }
        }
    }

    /// Move every entry of `other` into this map, running the usual
    /// binding logic. Used when a class reference is fulfilled by its
    /// definition.
    pub fn absorb(&mut self, other: MethodMap) {
        for (_, list) in other.methods {
            for m in list {
                self.add_method(m);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassMethod, MethodKind, MethodReference};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn class_method(name: &str, go_name: &str) -> MethodRc {
        Rc::new(RefCell::new(Method::Class(ClassMethod {
            class_name: "C".to_string(),
            name: name.to_string(),
            go_name: go_name.to_string(),
            ret: None,
            rcvr: None,
            kind: MethodKind::Instance,
            params: vec![],
            body: None,
        })))
    }

    fn reference(name: &str) -> MethodRc {
        Rc::new(RefCell::new(Method::Reference(MethodReference {
            class_name: None,
            name: name.to_string(),
            go_name: name.to_string(),
            arg_types: vec![],
            resolved: None,
        })))
    }

    #[test]
    fn reference_binds_to_later_definition() {
        let mut map = MethodMap::default();
        let r = reference("f");
        map.add_method(r.clone());

        let real = class_method("f", "F");
        map.add_method(real.clone());

        // the reference now resolves through to the definition
        assert_eq!(r.borrow().go_name(), "F");
        assert!(!r.borrow().is_unresolved_reference());

        // the map holds a single bound entry
        assert_eq!(map.list("f").len(), 1);
        assert!(Rc::ptr_eq(&map.list("f")[0], &real));
    }

    #[test]
    fn renumber_keeps_first_name() {
        let mut map = MethodMap::default();
        map.add_method(class_method("f", "F"));
        map.add_method(class_method("f", "F"));
        map.add_method(class_method("f", "F"));

        map.renumber_duplicates();

        let names: Vec<String> = map.list("f").iter().map(|m| m.borrow().go_name()).collect();
        assert_eq!(names, vec!["F", "F2", "F3"]);
    }

    #[test]
    fn duplicate_references_are_dropped() {
        let mut map = MethodMap::default();
        map.add_method(reference("g"));
        map.add_method(reference("g"));
        assert_eq!(map.list("g").len(), 1);
    }
}

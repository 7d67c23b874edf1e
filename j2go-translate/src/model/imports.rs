//! The program's import set and imported-type dictionary.

use j2go_goast::ast::Decl as GoDecl;
use rustc_hash::FxHashMap;
use tracing::warn;

/// Go packages to import, plus the map from imported Java type names to
/// their Go package (`Payload` → `daq`).
#[derive(Debug, Default)]
pub struct ImportSet {
    packages: FxHashMap<String, Vec<String>>,
    types: FxHashMap<String, String>,
}

impl ImportSet {
    /// Record an import of `pkg`, optionally noting that Java type
    /// `class_name` now lives there.
    pub fn add(&mut self, pkg: &str, class_name: Option<&str>) {
        let classes = self.packages.entry(pkg.to_string()).or_default();

        if let Some(cls) = class_name {
            if !classes.iter().any(|c| c == cls) {
                classes.push(cls.to_string());
            }

            match self.types.get(cls) {
                None => {
                    self.types.insert(cls.to_string(), pkg.to_string());
                }
                Some(existing) if existing != pkg => {
                    warn!("Found multiple import entries for {}", cls);
                }
                _ => {}
            }
        }
    }

    /// The package-qualified Go name for an imported Java type.
    pub fn imported_type(&self, name: &str) -> Option<String> {
        self.types.get(name).map(|pkg| format!("{}.{}", pkg, name))
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// One `import "pkg"` declaration per package, sorted.
    pub fn decls(&self) -> Vec<GoDecl> {
        let mut keys: Vec<&String> = self.packages.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| GoDecl::Import { path: k.clone() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_type_lookup() {
        let mut imports = ImportSet::default();
        imports.add("daq", Some("Payload"));
        assert_eq!(imports.imported_type("Payload").as_deref(), Some("daq.Payload"));
        assert_eq!(imports.imported_type("Other"), None);
    }

    #[test]
    fn sorted_single_line_imports() {
        let mut imports = ImportSet::default();
        imports.add("os", None);
        imports.add("fmt", None);
        imports.add("os", None);

        let decls = imports.decls();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], GoDecl::Import { path: "fmt".into() });
        assert_eq!(decls[1], GoDecl::Import { path: "os".into() });
    }
}

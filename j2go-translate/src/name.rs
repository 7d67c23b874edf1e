//! Dotted Java type names.

use std::fmt;

const PRIMITIVES: &[&str] = &[
    "void", "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

/// A possibly-dotted Java name (`foo.bar.Baz`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    parts: Vec<String>,
}

impl TypeName {
    pub fn new(name: &str) -> TypeName {
        TypeName {
            parts: name.split('.').map(str::to_string).collect(),
        }
    }

    pub fn from_parts(parts: Vec<String>) -> TypeName {
        TypeName { parts }
    }

    pub fn is_dotted(&self) -> bool {
        self.parts.len() > 1
    }

    /// True for the Java primitive keywords (`String` is not one of them;
    /// the type model special-cases it).
    pub fn is_primitive(&self) -> bool {
        self.parts.len() == 1 && PRIMITIVES.contains(&self.parts[0].as_str())
    }

    pub fn first(&self) -> &str {
        &self.parts[0]
    }

    /// The final path component (`Baz` of `foo.bar.Baz`).
    pub fn last_type(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// Everything after the first component, as a dotted name.
    pub fn not_first(&self) -> TypeName {
        TypeName {
            parts: self.parts[1..].to_vec(),
        }
    }

    /// Everything before the final component (`foo.bar` of `foo.bar.Baz`).
    pub fn package_string(&self) -> String {
        if self.parts.len() < 2 {
            return String::new();
        }
        self.parts[..self.parts.len() - 1].join(".")
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_parts() {
        let n = TypeName::new("java.util.List");
        assert!(n.is_dotted());
        assert_eq!(n.first(), "java");
        assert_eq!(n.last_type(), "List");
        assert_eq!(n.not_first().to_string(), "util.List");
        assert_eq!(n.package_string(), "java.util");
    }

    #[test]
    fn primitives() {
        assert!(TypeName::new("int").is_primitive());
        assert!(TypeName::new("boolean").is_primitive());
        assert!(!TypeName::new("String").is_primitive());
        assert!(!TypeName::new("java.lang.Integer").is_primitive());
    }
}

//! Enums become a named int type plus an iota constant block.

use j2go_goast::ast::{Decl as GoDecl, Expr as GoExpr, ValueSpec};

#[derive(Debug)]
pub struct EnumDef {
    pub name: String,
    pub constants: Vec<String>,
}

impl EnumDef {
    pub fn decls(&self) -> Vec<GoDecl> {
        let mut decls = vec![GoDecl::Type {
            name: self.name.clone(),
            ty: GoExpr::ident("int"),
        }];

        if self.constants.is_empty() {
            return decls;
        }

        let specs = self
            .constants
            .iter()
            .enumerate()
            .map(|(i, c)| ValueSpec {
                names: vec![c.clone()],
                ty: if i == 0 {
                    Some(GoExpr::Ident(self.name.clone()))
                } else {
                    None
                },
                values: if i == 0 {
                    vec![GoExpr::ident("iota")]
                } else {
                    vec![]
                },
            })
            .collect();

        decls.push(GoDecl::Const { specs });
        decls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use j2go_goast::printer::print_file;
    use j2go_goast::ast::File;

    #[test]
    fn iota_block() {
        let e = EnumDef {
            name: "Color".to_string(),
            constants: vec!["RED".into(), "GREEN".into(), "BLUE".into()],
        };
        let out = print_file(&File {
            package: "main".into(),
            decls: e.decls(),
        });

        assert!(out.contains("type Color int"));
        assert!(out.contains("RED Color = iota"));
        assert!(out.contains("\tGREEN\n"));
        assert!(out.contains("\tBLUE\n"));
    }
}

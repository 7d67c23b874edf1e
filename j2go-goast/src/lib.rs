//! Go syntax tree and source printer.
//!
//! This crate is the serialization half of the j2go pipeline: the
//! translation core builds [`ast`] nodes and hands a finished [`ast::File`]
//! to [`printer::print_file`], which renders gofmt-shaped source text
//! (tab indentation, one statement per line, minimal parentheses).
//!
//! The node set is deliberately the subset of Go that translated Java
//! needs: there are no channels, goroutines or generics here.

pub mod ast;
pub mod printer;
pub mod token;

pub use ast::{Block, CaseClause, Decl, Expr, Field, File, FuncType, Stmt, ValueSpec};
pub use printer::print_file;
pub use token::{AssignOp, BinOp, Branch, UnOp};

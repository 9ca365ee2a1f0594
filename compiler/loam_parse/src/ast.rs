//! Minimal AST produced by the top-level parser.
//!
//! Only the shapes the skeletal grammar can build: function definitions
//! introduced by `+fn`, and flat atom lists standing in for expression
//! statements until the expression grammar lands.

use loam_lexer_core::{Nonnegative, WordKind};

/// A top-level item.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    FnDef(FnDef),
    Expr(ExprStmt),
}

/// A function definition: `+fn name(param, ...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<String>,
}

/// An expression statement, kept as its raw atoms.
#[derive(Clone, Debug, PartialEq)]
pub struct ExprStmt {
    pub atoms: Vec<Atom>,
}

/// One token's worth of expression material.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Word { kind: WordKind, text: String },
    Number(Nonnegative),
    Str(String),
}

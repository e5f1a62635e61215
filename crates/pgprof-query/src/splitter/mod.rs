//! SQL script splitting
//!
//! Splits raw SQL text into statements using lexical rules only: quotes,
//! doubled-quote escapes, `--` and `/* */` comments, and dollar-quoted bodies.
//! No SQL grammar is involved.

mod lexer;

pub use lexer::{
    RegionKind, Statement, StatementSplitter, UnterminatedRegion, number_statements,
    split_statements, split_statements_strict, statements,
};

//! A tree-walking interpreter for Lox.
//!
//! Tokens from the [`scanner`] are turned into statements by the
//! [`parser`] and run directly by the [`interpreter`]; nothing is compiled.
//!
//! ```
//! use tree_lox::lox::ConsoleReporter;
//! use tree_lox::parser::Parser;
//! use tree_lox::scanner::Scanner;
//!
//! let tokens = Scanner::new("print 1 + 2;").scan_tokens().unwrap();
//! let mut reporter = ConsoleReporter::new();
//! let statements = Parser::new(&mut reporter, tokens).parse();
//! assert!(statements.is_some());
//! ```

pub mod ast_printer;
pub mod environment;
pub mod expr;
pub mod interpreter;
pub mod lox;
pub mod lox_function;
pub mod parser;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod token_type;

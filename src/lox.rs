use std::fs;
use std::io;
use std::io::{BufRead, Write};
use std::thread;

use console::style;
use thiserror::Error;

use crate::interpreter::{ExprValue, Interpreter};
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::{RcToken, Token};
use crate::token_type::TokenType;

#[derive(Debug, Error)]
pub enum LoxError {
    #[error("[line {line}] Error: {message}")]
    ScanError { line: usize, message: String },
    #[error("[line {}] Error {}: {message}", .token.line, location(.token))]
    ParseError { token: RcToken, message: String },
    #[error("{message}\n[line {}]", .token.line)]
    RuntimeError { token: RcToken, message: String },
    /// Calls nested past `Config::max_call_depth`. Fatal for the current run only.
    #[error("Stack overflow: more than {depth} nested calls.")]
    StackOverflow { depth: usize },
    /// Unwinds a `return` out to the enclosing call; never reaches a reporter.
    #[error("Can't return from top-level code.")]
    ReturnValue { value: ExprValue },
    #[error("Couldn't write output: {0}")]
    Io(#[from] io::Error),
}

/// Native stack given to a thread that runs Lox code.
///
/// Large enough for [`MAX_NESTING`](crate::parser::MAX_NESTING) levels of
/// syntax and the default call depth in an unoptimized build.
pub const STACK_SIZE: usize = 512 * 1024 * 1024;

/// Runs `f` on a fresh thread with [`STACK_SIZE`] bytes of stack and waits for it.
pub fn with_stack<F, T>(f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(String::from("lox"))
        .stack_size(STACK_SIZE)
        .spawn(f)?
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "interpreter thread panicked"))
}

fn location(token: &Token) -> String {
    if matches!(token.type_, TokenType::EOF) {
        String::from("at end")
    } else {
        format!("at '{}'", token.lexeme)
    }
}

/// Receives every diagnostic produced while scanning, parsing and running.
pub trait Reporter {
    fn error(&mut self, line: usize, message: &str);
    fn error_at(&mut self, token: &Token, message: &str);
    fn runtime_error(&mut self, err: &LoxError);
    fn had_error(&self) -> bool;
    fn had_runtime_error(&self) -> bool;

    fn report(&mut self, err: &LoxError) {
        match err {
            LoxError::ScanError { line, message } => self.error(*line, message),
            LoxError::ParseError { token, message } => self.error_at(token, message),
            LoxError::RuntimeError { .. }
            | LoxError::StackOverflow { .. }
            | LoxError::ReturnValue { .. }
            | LoxError::Io(_) => self.runtime_error(err),
        }
    }
}

/// Writes diagnostics to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn print(&self, line: usize, location: &str, message: &str) {
        let prefix = style(format!("[line {}]", line)).for_stderr().dim();
        let error = if location.is_empty() {
            style(String::from("Error")).for_stderr().red().bold()
        } else {
            style(format!("Error {}", location)).for_stderr().red().bold()
        };
        eprintln!("{} {}: {}", prefix, error, message);
    }
}

impl Reporter for ConsoleReporter {
    fn error(&mut self, line: usize, message: &str) {
        self.print(line, "", message);
        self.had_error = true;
    }

    fn error_at(&mut self, token: &Token, message: &str) {
        self.print(token.line, &location(token), message);
        self.had_error = true;
    }

    fn runtime_error(&mut self, err: &LoxError) {
        eprintln!("{}", style(err).for_stderr().red());
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }
}

pub struct Lox {
    pub reporter: ConsoleReporter,
    pub interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            reporter: ConsoleReporter::new(),
            interpreter: Interpreter::new(),
        }
    }

    pub fn run_file(&mut self, path: &str) -> io::Result<()> {
        let contents = fs::read_to_string(path)?;
        self.run(&contents);
        Ok(())
    }

    pub fn run_prompt(&mut self) -> io::Result<()> {
        println!("Lox tree-walk interpreter");
        let stdin = io::stdin();
        let mut input = stdin.lock();
        loop {
            print!("> ");
            io::stdout().flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                println!("Exit");
                break;
            }
            let trimmed = line.trim_end();
            if trimmed.ends_with(';') || trimmed.ends_with('}') {
                self.run(&line);
            } else if !trimmed.is_empty() {
                self.run_expression(&line);
            }
            self.reporter.reset();
        }
        Ok(())
    }

    /// Runs a whole program.
    pub fn run(&mut self, source: &str) {
        let Some(tokens) = self.scan(source) else {
            return;
        };
        let statements = Parser::new(&mut self.reporter, tokens).parse();
        if let Some(statements) = statements {
            self.interpreter.interpret(&statements, &mut self.reporter);
        }
    }

    /// Evaluates one comma-separated expression and prints its value.
    pub fn run_expression(&mut self, source: &str) {
        let Some(tokens) = self.scan(source) else {
            return;
        };
        let expr = Parser::new(&mut self.reporter, tokens).parse_expression();
        if let Some(expr) = expr {
            self.interpreter.interpret_expression(&expr, &mut self.reporter);
        }
    }

    fn scan(&mut self, source: &str) -> Option<Vec<RcToken>> {
        match Scanner::new(source).scan_tokens() {
            Ok(tokens) => Some(tokens),
            Err(err) => {
                self.reporter.report(&err);
                None
            }
        }
    }
}

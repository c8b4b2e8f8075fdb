//! Tree-walking evaluator: a recursive function over the `ast` tag, holding
//! a flat variable environment plus the collaborators every built-in needs
//! (sandbox resolver, execution budget, semantic index cache) and writing
//! `print()` output to a caller-supplied sink.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use crate::ast::{BinaryOp, CompareOp, Expr, Literal, ListItem, Program, Stmt, UnaryOp};
use crate::budget::Budget;
use crate::config::ExtractionSettings;
use crate::error::{DslError, SourceLocation};
use crate::runtime::directory::Directory;
use crate::runtime::file::File;
use crate::sandbox::Sandbox;
use crate::semantic::index::IndexCache;
use crate::value::{Builtin, MethodReceiver, Value};

pub type Environment = HashMap<String, Value>;

/// Holds everything a statement/expression evaluation needs beyond the AST
/// node itself. Entirely local to one `run_script`/`execute_fdsl` call — no
/// process-wide mutable state is touched by evaluation.
pub struct Evaluator<'a> {
    env: Environment,
    sandbox: &'a Sandbox,
    budget: &'a Budget,
    cache: &'a IndexCache,
    cwd: PathBuf,
    settings: ExtractionSettings,
    stdout: &'a mut dyn Write,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        sandbox: &'a Sandbox,
        budget: &'a Budget,
        cache: &'a IndexCache,
        cwd: PathBuf,
        settings: ExtractionSettings,
        stdout: &'a mut dyn Write,
    ) -> Self {
        let mut env = Environment::new();
        env.insert("Directory".to_string(), Value::Builtin(Builtin::Directory));
        env.insert("File".to_string(), Value::Builtin(Builtin::File));
        env.insert("len".to_string(), Value::Builtin(Builtin::Len));
        env.insert("print".to_string(), Value::Builtin(Builtin::Print));
        Self {
            env,
            sandbox,
            budget,
            cache,
            cwd,
            settings,
            stdout,
        }
    }

    pub fn run(&mut self, program: &Program) -> Result<(), DslError> {
        tracing::debug!(statements = program.statements.len(), "Starting evaluator run");
        self.exec_block(&program.statements)
    }

    pub fn into_environment(self) -> Environment {
        self.env
    }

    fn exec_block(&mut self, statements: &[Stmt]) -> Result<(), DslError> {
        for stmt in statements {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), DslError> {
        self.budget.check("evaluator loop")?;
        match stmt {
            Stmt::Assign { name, expr, .. } => {
                let value = self.eval_expr(expr)?;
                self.env.insert(name.clone(), value);
                Ok(())
            }
            Stmt::ExprStmt { expr, .. } => {
                self.eval_expr(expr)?;
                Ok(())
            }
            Stmt::For { var_name, iterable, body, loc } => {
                let value = self.eval_expr(iterable)?;
                let items = self.iterate(&value, *loc)?;
                for item in items {
                    self.budget.check("evaluator loop")?;
                    self.env.insert(var_name.clone(), item);
                    self.exec_block(body)?;
                }
                Ok(())
            }
            Stmt::If { branches, else_body, .. } => {
                for (cond, body) in branches {
                    if self.eval_expr(cond)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = else_body {
                    self.exec_block(body)?;
                }
                Ok(())
            }
        }
    }

    /// Values a `for` loop can walk: sequences, and directories (iterating
    /// their files per the directory's own `recursive` flag).
    fn iterate(&self, value: &Value, loc: SourceLocation) -> Result<Vec<Value>, DslError> {
        match value {
            Value::Seq(items) => Ok(items.clone()),
            Value::Dir(dir) => {
                let files = dir.enumerate_files(self.cache, None)?;
                Ok(files.into_iter().map(Value::File).collect())
            }
            other => Err(DslError::runtime_at(
                format!("'{}' is not iterable", other.type_name()),
                loc,
                String::new(),
            )),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, DslError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Int(n) => Value::Int(*n),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
            }),
            Expr::Name { id, loc } => self
                .env
                .get(id)
                .cloned()
                .ok_or_else(|| DslError::runtime_at(format!("Unknown variable '{id}'"), *loc, String::new())),
            Expr::List { items, .. } => {
                let mut out = Vec::new();
                for item in items {
                    match item {
                        ListItem::Item(expr) => out.push(self.eval_expr(expr)?),
                        ListItem::Range { start, end, loc } => {
                            let start = self.eval_int(start, *loc)?;
                            let end = self.eval_int(end, *loc)?;
                            if start <= end {
                                out.extend((start..=end).map(Value::Int));
                            } else {
                                out.extend((end..=start).rev().map(Value::Int));
                            }
                        }
                    }
                }
                Ok(Value::Seq(out))
            }
            Expr::Attr { obj, name, loc } => {
                let receiver = self.eval_expr(obj)?;
                match receiver {
                    Value::Dir(dir) => Ok(Value::Method(MethodReceiver::Dir(dir), name.clone())),
                    Value::File(file) => Ok(Value::Method(MethodReceiver::File(file), name.clone())),
                    other => Err(DslError::runtime_at(
                        format!("'{}' has no attribute '{name}'", other.type_name()),
                        *loc,
                        String::new(),
                    )),
                }
            }
            Expr::Call { callee, args, kwargs, loc } => self.eval_call(callee, args, kwargs, *loc),
            Expr::Unary { op, operand, loc } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Neg => value.neg().map_err(|e| relocate(e, *loc)),
                    UnaryOp::Not => Ok(value.not()),
                }
            }
            Expr::Binary { op, left, right, loc } => {
                if matches!(op, BinaryOp::And | BinaryOp::Or) {
                    let left_value = self.eval_expr(left)?;
                    let left_truthy = left_value.is_truthy();
                    return match op {
                        BinaryOp::And if !left_truthy => Ok(Value::Bool(false)),
                        BinaryOp::Or if left_truthy => Ok(Value::Bool(true)),
                        _ => Ok(Value::Bool(self.eval_expr(right)?.is_truthy())),
                    };
                }
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                let result = match op {
                    BinaryOp::Add => left.add(&right),
                    BinaryOp::Sub => left.sub(&right),
                    BinaryOp::Mul => left.mul(&right),
                    BinaryOp::Div => left.div(&right),
                    BinaryOp::Mod => left.rem(&right),
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                };
                result.map_err(|e| relocate(e, *loc))
            }
            Expr::Compare { op, left, right, loc } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                match op {
                    CompareOp::Eq => Ok(Value::Bool(left.values_equal(&right))),
                    CompareOp::Neq => Ok(Value::Bool(!left.values_equal(&right))),
                    _ => {
                        let ordering = left.partial_cmp(&right).ok_or_else(|| {
                            DslError::runtime_at(
                                format!(
                                    "Cannot compare {} and {}",
                                    left.type_name(),
                                    right.type_name()
                                ),
                                *loc,
                                String::new(),
                            )
                        })?;
                        let result = match op {
                            CompareOp::Lt => ordering.is_lt(),
                            CompareOp::Lte => ordering.is_le(),
                            CompareOp::Gt => ordering.is_gt(),
                            CompareOp::Gte => ordering.is_ge(),
                            CompareOp::Eq | CompareOp::Neq => unreachable!("handled above"),
                        };
                        Ok(Value::Bool(result))
                    }
                }
            }
        }
    }

    fn eval_int(&mut self, expr: &Expr, loc: SourceLocation) -> Result<i64, DslError> {
        match self.eval_expr(expr)? {
            Value::Int(n) => Ok(n),
            other => Err(DslError::runtime_at(
                format!("Range bounds must be integers, got {}", other.type_name()),
                loc,
                String::new(),
            )),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], kwargs: &[(String, Expr)], loc: SourceLocation) -> Result<Value, DslError> {
        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            positional.push(self.eval_expr(arg)?);
        }
        let mut named = Vec::with_capacity(kwargs.len());
        for (name, expr) in kwargs {
            named.push((name.clone(), self.eval_expr(expr)?));
        }

        if let Expr::Name { id, .. } = callee {
            if let Some(Value::Builtin(builtin)) = self.env.get(id).cloned() {
                return self.call_builtin(builtin, positional, named, loc);
            }
        }

        match self.eval_expr(callee)? {
            Value::Method(receiver, name) => self.call_method(receiver, &name, positional, named, loc),
            Value::Builtin(builtin) => self.call_builtin(builtin, positional, named, loc),
            other => Err(DslError::runtime_at(
                format!("'{}' is not callable", other.type_name()),
                loc,
                String::new(),
            )),
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>, kwargs: Vec<(String, Value)>, loc: SourceLocation) -> Result<Value, DslError> {
        match builtin {
            Builtin::Directory => self.builtin_directory(args, kwargs, loc),
            Builtin::File => self.builtin_file(args, kwargs, loc),
            Builtin::Len => self.builtin_len(args, loc),
            Builtin::Print => self.builtin_print(args, loc),
        }
    }

    fn builtin_directory(&mut self, args: Vec<Value>, kwargs: Vec<(String, Value)>, loc: SourceLocation) -> Result<Value, DslError> {
        let path = take_string_arg(&args, &kwargs, 0, "path", loc)?;
        let recursive = take_bool_opt(&args, &kwargs, 1, "recursive", true, loc)?;
        let resolved = self.sandbox.resolve(&path).map_err(|e| relocate(e, loc))?;
        if !resolved.is_dir() && self.cache.find_for_path(&resolved).is_none() {
            tracing::warn!(path = %path, "Directory() target missing on disk and not covered by any semantic index");
            return Err(DslError::runtime_at(
                format!("No such directory: {path}"),
                loc,
                String::new(),
            ));
        }
        tracing::debug!(path = %resolved.display(), recursive, "Resolved Directory()");
        let directory = Directory::new(resolved, self.cwd.clone(), recursive, self.settings);
        Ok(Value::Dir(Rc::new(directory)))
    }

    fn builtin_file(&mut self, args: Vec<Value>, kwargs: Vec<(String, Value)>, loc: SourceLocation) -> Result<Value, DslError> {
        let path = take_string_arg(&args, &kwargs, 0, "path", loc)?;
        let resolved = self.sandbox.resolve(&path).map_err(|e| relocate(e, loc))?;
        let indexed = self
            .cache
            .find_for_path(&resolved)
            .map(|(root, index)| index.covers_file(&crate::runtime::relative_posix(&resolved, &root)))
            .unwrap_or(false);
        if !resolved.is_file() && !indexed {
            tracing::warn!(path = %path, "File() target missing on disk and not covered by any semantic index");
            return Err(DslError::runtime_at(
                format!("No such file: {path}"),
                loc,
                String::new(),
            ));
        }
        if indexed && !resolved.is_file() {
            tracing::debug!(path = %resolved.display(), "File() served from semantic index after source deletion");
        }
        let file = File::new(resolved, self.cwd.clone(), self.settings);
        Ok(Value::File(Rc::new(file)))
    }

    fn builtin_len(&mut self, args: Vec<Value>, loc: SourceLocation) -> Result<Value, DslError> {
        let value = args.into_iter().next().ok_or_else(|| arity_error("len", 1, loc))?;
        let n = match value {
            Value::Seq(items) => items.len(),
            Value::Str(s) => s.chars().count(),
            Value::Dir(dir) => dir.len(self.cache, None)?,
            other => {
                return Err(DslError::runtime_at(
                    format!("len() is not defined for {}", other.type_name()),
                    loc,
                    String::new(),
                ))
            }
        };
        Ok(Value::Int(n as i64))
    }

    fn builtin_print(&mut self, args: Vec<Value>, loc: SourceLocation) -> Result<Value, DslError> {
        let rendered: Vec<String> = args.iter().map(Value::render).collect();
        writeln!(self.stdout, "{}", rendered.join(" ")).map_err(|e| {
            DslError::runtime_at(format!("Failed to write to stdout: {e}"), loc, String::new())
        })?;
        Ok(Value::Bool(true))
    }

    fn call_method(
        &mut self,
        receiver: MethodReceiver,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        loc: SourceLocation,
    ) -> Result<Value, DslError> {
        match receiver {
            MethodReceiver::Dir(dir) => self.call_directory_method(&dir, name, args, kwargs, loc),
            MethodReceiver::File(file) => self.call_file_method(&file, name, args, kwargs, loc),
        }
    }

    fn call_directory_method(
        &mut self,
        dir: &Rc<Directory>,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        loc: SourceLocation,
    ) -> Result<Value, DslError> {
        match name {
            "files" => {
                let recursive = take_optional_bool(&args, &kwargs, 0, "recursive", loc)?;
                let files = dir.enumerate_files(self.cache, recursive)?;
                Ok(Value::Seq(files.into_iter().map(Value::File).collect()))
            }
            "search" => {
                let pattern = take_string_arg(&args, &kwargs, 0, "pattern", loc)?;
                let scope = take_string_opt(&args, &kwargs, 1, "scope", "name", loc)?;
                let in_content = take_bool_opt(&args, &kwargs, 2, "in_content", false, loc)?;
                let recursive = take_optional_bool(&args, &kwargs, 3, "recursive", loc)?;
                let ignore_case = take_bool_opt(&args, &kwargs, 4, "ignore_case", false, loc)?;
                let matches = dir.search(self.cache, self.budget, &pattern, &scope, in_content, recursive, ignore_case)?;
                Ok(Value::Seq(matches.into_iter().map(Value::File).collect()))
            }
            "tree" => {
                let max_depth = take_optional_int(&args, &kwargs, 0, "max_depth", loc)?;
                let max_entries = take_optional_int(&args, &kwargs, 1, "max_entries", loc)?;
                Ok(Value::Str(dir.tree(max_depth, max_entries)?))
            }
            other => Err(DslError::runtime_at(
                format!("Directory has no method '{other}'"),
                loc,
                String::new(),
            )),
        }
    }

    fn call_file_method(
        &mut self,
        file: &Rc<File>,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        loc: SourceLocation,
    ) -> Result<Value, DslError> {
        match name {
            "read" => {
                let pages = take_optional_arg(&args, &kwargs, 0, "pages");
                Ok(file.read(self.cache, self.budget, pages)?)
            }
            "search" => {
                let pattern = take_string_arg(&args, &kwargs, 0, "pattern", loc)?;
                let ignore_case = take_bool_opt(&args, &kwargs, 1, "ignore_case", false, loc)?;
                let pages = file.search(self.cache, self.budget, &pattern, ignore_case)?;
                Ok(Value::Seq(pages.into_iter().map(|p| Value::Int(p as i64)).collect()))
            }
            "contains" => {
                let pattern = take_string_arg(&args, &kwargs, 0, "pattern", loc)?;
                let ignore_case = take_bool_opt(&args, &kwargs, 1, "ignore_case", false, loc)?;
                Ok(Value::Bool(file.contains(self.cache, self.budget, &pattern, ignore_case)?))
            }
            "head" => Ok(Value::Str(file.head(self.cache, self.budget)?)),
            "tail" => Ok(Value::Str(file.tail(self.cache, self.budget)?)),
            "table" => {
                let max_items = take_optional_int(&args, &kwargs, 0, "max_items", loc)?;
                Ok(Value::Str(file.table(self.cache, self.budget, max_items)?))
            }
            "snippets" => {
                let pattern = take_string_arg(&args, &kwargs, 0, "pattern", loc)?;
                let max_results = take_optional_int(&args, &kwargs, 1, "max_results", loc)?;
                let context_chars = take_optional_int(&args, &kwargs, 2, "context_chars", loc)?;
                let ignore_case = take_bool_opt(&args, &kwargs, 3, "ignore_case", false, loc)?;
                let snippets = file.snippets(self.cache, self.budget, &pattern, max_results, context_chars, ignore_case)?;
                Ok(Value::Seq(snippets.into_iter().map(Value::Str).collect()))
            }
            "semantic_search" => {
                let query = take_string_arg(&args, &kwargs, 0, "query", loc)?;
                let top_k = take_optional_int(&args, &kwargs, 1, "top_k", loc)?;
                let pages = file.semantic_search(self.cache, &query, top_k)?;
                Ok(Value::Seq(pages.into_iter().map(|p| Value::Int(p as i64)).collect()))
            }
            other => Err(DslError::runtime_at(
                format!("File has no method '{other}'"),
                loc,
                String::new(),
            )),
        }
    }
}

fn relocate(err: DslError, loc: SourceLocation) -> DslError {
    match err {
        DslError::Runtime { message, loc: None, source_line: None } => {
            DslError::runtime_at(message, loc, String::new())
        }
        other => other,
    }
}

fn arity_error(name: &str, expected: usize, loc: SourceLocation) -> DslError {
    DslError::runtime_at(format!("{name}() requires {expected} argument(s)"), loc, String::new())
}

fn find_kwarg<'a>(kwargs: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn take_string_arg(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str, loc: SourceLocation) -> Result<String, DslError> {
    let value = args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned());
    match value {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(DslError::runtime_at(
            format!("'{name}' must be a string, got {}", other.type_name()),
            loc,
            String::new(),
        )),
        None => Err(DslError::runtime_at(format!("Missing required argument '{name}'"), loc, String::new())),
    }
}

fn take_string_opt(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str, default: &str, loc: SourceLocation) -> Result<String, DslError> {
    match args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned()) {
        None => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(DslError::runtime_at(
            format!("'{name}' must be a string, got {}", other.type_name()),
            loc,
            String::new(),
        )),
    }
}

fn take_bool_opt(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str, default: bool, loc: SourceLocation) -> Result<bool, DslError> {
    match args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned()) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(b),
        Some(other) => Err(DslError::runtime_at(
            format!("'{name}' must be a boolean, got {}", other.type_name()),
            loc,
            String::new(),
        )),
    }
}

fn take_optional_bool(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str, loc: SourceLocation) -> Result<Option<bool>, DslError> {
    match args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned()) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(DslError::runtime_at(
            format!("'{name}' must be a boolean, got {}", other.type_name()),
            loc,
            String::new(),
        )),
    }
}

fn take_optional_int(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str, loc: SourceLocation) -> Result<Option<i64>, DslError> {
    match args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned()) {
        None => Ok(None),
        Some(Value::Int(n)) => Ok(Some(n)),
        Some(other) => Err(DslError::runtime_at(
            format!("'{name}' must be an integer, got {}", other.type_name()),
            loc,
            String::new(),
        )),
    }
}

fn take_optional_arg(args: &[Value], kwargs: &[(String, Value)], index: usize, name: &str) -> Option<Value> {
    args.get(index).cloned().or_else(|| find_kwarg(kwargs, name).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use std::fs;

    fn run(source: &str, dir: &std::path::Path) -> String {
        let sandbox = Sandbox::new(dir).unwrap();
        let budget = Budget::unbounded();
        let cache = IndexCache::new();
        let program = Parser::parse(source).unwrap();
        let mut out = Vec::new();
        {
            let mut evaluator = Evaluator::new(&sandbox, &budget, &cache, dir.to_path_buf(), ExtractionSettings::default(), &mut out);
            evaluator.run(&program).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn scenario_s1_directory_and_file_basics() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha\nbeta\ngamma\n").unwrap();
        let source = "d = Directory(\".\")\nprint(len(d))\nf = File(\"a.txt\")\nprint(f.contains(\"beta\"))\nprint(f.search(\"alpha\"))\n";
        let output = run(source, dir.path());
        assert_eq!(output, "1\ntrue\n[1]\n");
    }

    #[test]
    fn scenario_s2_range_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let output = run("pages = [1, 5:8, 15]\nprint(pages)\n", dir.path());
        assert_eq!(output, "[1, 5, 6, 7, 8, 15]\n");
    }

    #[test]
    fn scenario_s6_uses_evaluator_loop_phase_name() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let budget = Budget::new(Some(std::time::Duration::from_millis(1)));
        let cache = IndexCache::new();
        let program = Parser::parse("for i in [1:1000000000]:\n    x = i\n").unwrap();
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&sandbox, &budget, &cache, dir.path().to_path_buf(), ExtractionSettings::default(), &mut out);
        let err = evaluator.run(&program).unwrap_err();
        match err {
            DslError::Timeout { elapsed_s, phase, .. } => {
                assert!(elapsed_s < 1.0);
                assert_eq!(phase, "evaluator loop");
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn if_elif_else_picks_first_truthy_branch() {
        let dir = tempfile::tempdir().unwrap();
        let source = "x = 2\nif x == 1:\n    print(\"one\")\nelif x == 2:\n    print(\"two\")\nelse:\n    print(\"other\")\n";
        let output = run(source, dir.path());
        assert_eq!(output, "two\n");
    }

    #[test]
    fn unknown_variable_is_runtime_error() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let budget = Budget::unbounded();
        let cache = IndexCache::new();
        let program = Parser::parse("print(missing)\n").unwrap();
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&sandbox, &budget, &cache, dir.path().to_path_buf(), ExtractionSettings::default(), &mut out);
        let err = evaluator.run(&program).unwrap_err();
        assert!(matches!(err, DslError::Runtime { .. }));
    }

    #[test]
    fn sandbox_violation_names_path_and_root() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let budget = Budget::unbounded();
        let cache = IndexCache::new();
        let program = Parser::parse("d = Directory(\"/\")\n").unwrap();
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&sandbox, &budget, &cache, dir.path().to_path_buf(), ExtractionSettings::default(), &mut out);
        let err = evaluator.run(&program).unwrap_err();
        assert!(matches!(err, DslError::Sandbox { .. }));
    }
}

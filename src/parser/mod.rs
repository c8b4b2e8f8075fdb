//! Indentation-aware, line-structured parser. Tabs in indentation are a
//! syntax error; blocks are runs of non-blank, non-comment lines at a
//! greater indent than their parent. Expressions on each statement line are
//! handed to `expr::ExpressionParser` once the line (and any bracket
//! continuations) has been assembled.

mod expr;

use crate::ast::{Expr, Program, Stmt};
use crate::error::{DslError, SourceLocation};
use expr::ExpressionParser;

const IDENTIFIER_START: fn(char) -> bool = |c| c.is_alphabetic() || c == '_';

pub struct Parser<'a> {
    lines: Vec<&'a str>,
    index: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            index: 0,
        }
    }

    pub fn parse(source: &'a str) -> Result<Program, DslError> {
        let mut parser = Parser::new(source);
        let statements = parser.parse_block(0)?;
        Ok(Program { statements })
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn current_line(&self) -> &'a str {
        self.lines[self.index]
    }

    fn raise(&self, message: impl Into<String>, line: usize, column: usize) -> DslError {
        let source_line = if line >= 1 && line <= self.lines.len() {
            self.lines[line - 1]
        } else {
            ""
        };
        DslError::syntax(message, line, column, source_line)
    }

    fn strip_comment(&self, raw_line: &str) -> String {
        let mut in_quote: Option<char> = None;
        let mut escaped = false;
        for (idx, ch) in raw_line.char_indices() {
            if let Some(q) = in_quote {
                if escaped {
                    escaped = false;
                    continue;
                }
                if ch == '\\' {
                    escaped = true;
                    continue;
                }
                if ch == q {
                    in_quote = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' => in_quote = Some(ch),
                '#' => return raw_line[..idx].to_string(),
                _ => {}
            }
        }
        raw_line.to_string()
    }

    fn is_blank_or_comment(&self, raw_line: &str) -> bool {
        self.strip_comment(raw_line).trim().is_empty()
    }

    fn leading_indent(&self, raw_line: &str, line_no: usize) -> Result<usize, DslError> {
        let bytes: Vec<char> = raw_line.chars().collect();
        if bytes.first() == Some(&'\t') {
            return Err(self.raise("Tabs are not supported for indentation", line_no, 1));
        }
        let mut indent = 0;
        for &ch in &bytes {
            if ch == ' ' {
                indent += 1;
                continue;
            }
            if ch == '\t' {
                return Err(self.raise("Tabs are not supported for indentation", line_no, indent + 1));
            }
            break;
        }
        Ok(indent)
    }

    fn parse_block(&mut self, expected_indent: usize) -> Result<Vec<Stmt>, DslError> {
        let mut statements = Vec::new();
        while self.index < self.line_count() {
            let raw_line = self.current_line();
            let line_no = self.index + 1;
            if self.is_blank_or_comment(raw_line) {
                self.index += 1;
                continue;
            }

            let indent = self.leading_indent(raw_line, line_no)?;
            if indent < expected_indent {
                break;
            }
            if indent > expected_indent {
                return Err(self.raise("Unexpected indentation", line_no, indent + 1));
            }

            let stripped = self.strip_comment(raw_line);
            let stripped = stripped.trim_end();
            let text = &stripped[indent.min(stripped.len())..];
            statements.push(self.parse_statement(text, line_no, indent)?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self, text: &str, line_no: usize, indent: usize) -> Result<Stmt, DslError> {
        if let Some(rest) = text.strip_prefix("for ") {
            let _ = rest;
            return self.parse_for_statement(text, line_no, indent);
        }
        if let Some(rest) = text.strip_prefix("if ") {
            let _ = rest;
            return self.parse_if_statement(text, line_no, indent);
        }
        if text.starts_with("elif ") {
            return Err(self.raise("'elif' without matching 'if'", line_no, indent + 1));
        }
        if text == "else:" {
            return Err(self.raise("'else' without matching 'if'", line_no, indent + 1));
        }

        if let Some(assign_index) = find_assignment(text) {
            let lhs = text[..assign_index].trim();
            let rhs = text[assign_index + 1..].trim();
            if !is_identifier(lhs) {
                return Err(self.raise(
                    "Invalid assignment target. Only simple variable names are allowed",
                    line_no,
                    indent + 1,
                ));
            }
            if rhs.is_empty() {
                return Err(self.raise(
                    "Missing expression on right side of assignment",
                    line_no,
                    indent + assign_index + 2,
                ));
            }
            let rhs_offset = text.find(rhs).unwrap_or(assign_index + 1);
            let expr_col = indent + rhs_offset + 1;
            let (rhs_full, consumed) = self.collect_continued_expression(rhs, line_no)?;
            let expr = self.parse_expression(&rhs_full, line_no, expr_col)?;
            self.index += consumed;
            return Ok(Stmt::Assign {
                name: lhs.to_string(),
                expr,
                loc: SourceLocation::new(line_no, indent + 1),
            });
        }

        let (expr_text, consumed) = self.collect_continued_expression(text, line_no)?;
        let expr = self.parse_expression(&expr_text, line_no, indent + 1)?;
        self.index += consumed;
        Ok(Stmt::ExprStmt {
            expr,
            loc: SourceLocation::new(line_no, indent + 1),
        })
    }

    fn collect_continued_expression(&self, text: &str, line_no: usize) -> Result<(String, usize), DslError> {
        let mut expression = text.to_string();
        let mut balance = delimiter_balance(text);
        let mut consumed = 1;

        while balance > 0 {
            let next_index = self.index + consumed;
            if next_index >= self.line_count() {
                return Err(self.raise(
                    "Unterminated expression. Missing closing bracket/parenthesis",
                    line_no,
                    1,
                ));
            }
            let next_line = self.strip_comment(self.lines[next_index]);
            let next_line = next_line.trim().to_string();
            expression = format!("{expression}\n{next_line}");
            balance += delimiter_balance(&next_line);
            consumed += 1;
        }

        Ok((expression, consumed))
    }

    fn parse_for_statement(&mut self, text: &str, line_no: usize, indent: usize) -> Result<Stmt, DslError> {
        let (var_name, iterable_text) = match parse_for_header(text) {
            Some(parts) => parts,
            None => {
                return Err(self.raise(
                    "Invalid for-loop syntax. Use: for item in iterable:",
                    line_no,
                    indent + 1,
                ))
            }
        };
        let iterable_col = indent + text.find(iterable_text).unwrap_or(0) + 1;
        let iterable = self.parse_expression(iterable_text, line_no, iterable_col)?;
        self.index += 1;
        let body = self.parse_child_block(indent, line_no, indent + 1)?;
        Ok(Stmt::For {
            var_name: var_name.to_string(),
            iterable,
            body,
            loc: SourceLocation::new(line_no, indent + 1),
        })
    }

    fn parse_if_statement(&mut self, text: &str, line_no: usize, indent: usize) -> Result<Stmt, DslError> {
        let condition_text = match parse_if_header(text, "if ") {
            Some(c) => c,
            None => return Err(self.raise("Invalid if syntax. Use: if condition:", line_no, indent + 1)),
        };
        let condition_col = indent + text.find(condition_text).unwrap_or(0) + 1;
        let condition = self.parse_expression(condition_text, line_no, condition_col)?;
        self.index += 1;
        let body = self.parse_child_block(indent, line_no, indent + 1)?;
        let mut branches = vec![(condition, body)];
        let mut else_body: Option<Vec<Stmt>> = None;

        loop {
            let mut scan = self.index;
            while scan < self.line_count() && self.is_blank_or_comment(self.lines[scan]) {
                scan += 1;
            }
            if scan >= self.line_count() {
                self.index = scan;
                break;
            }

            let raw_line = self.lines[scan];
            let scan_line_no = scan + 1;
            let scan_indent = self.leading_indent(raw_line, scan_line_no)?;
            if scan_indent != indent {
                self.index = scan;
                break;
            }

            let stripped_owned = self.strip_comment(raw_line);
            let stripped_owned = stripped_owned.trim_end().to_string();
            let stripped = &stripped_owned[scan_indent.min(stripped_owned.len())..];

            if let Some(cond_text_owned) = stripped.strip_prefix("elif ").map(|_| stripped) {
                if else_body.is_some() {
                    return Err(self.raise("'elif' cannot appear after 'else'", scan_line_no, scan_indent + 1));
                }
                let cond_text = match parse_if_header(cond_text_owned, "elif ") {
                    Some(c) => c,
                    None => {
                        return Err(self.raise(
                            "Invalid elif syntax. Use: elif condition:",
                            scan_line_no,
                            scan_indent + 1,
                        ))
                    }
                };
                let cond_col = scan_indent + cond_text_owned.find(cond_text).unwrap_or(0) + 1;
                let cond = self.parse_expression(cond_text, scan_line_no, cond_col)?;
                self.index = scan + 1;
                let elif_body = self.parse_child_block(scan_indent, scan_line_no, scan_indent + 1)?;
                branches.push((cond, elif_body));
                continue;
            }

            if stripped == "else:" {
                if else_body.is_some() {
                    return Err(self.raise("Only one else block is allowed", scan_line_no, scan_indent + 1));
                }
                self.index = scan + 1;
                else_body = Some(self.parse_child_block(scan_indent, scan_line_no, scan_indent + 1)?);
                continue;
            }

            self.index = scan;
            break;
        }

        Ok(Stmt::If {
            branches,
            else_body,
            loc: SourceLocation::new(line_no, indent + 1),
        })
    }

    fn parse_child_block(&mut self, parent_indent: usize, parent_line: usize, parent_col: usize) -> Result<Vec<Stmt>, DslError> {
        let mut scan = self.index;
        while scan < self.line_count() && self.is_blank_or_comment(self.lines[scan]) {
            scan += 1;
        }
        if scan >= self.line_count() {
            return Err(self.raise("Expected an indented block", parent_line, parent_col));
        }
        let child_line = self.lines[scan];
        let child_line_no = scan + 1;
        let child_indent = self.leading_indent(child_line, child_line_no)?;
        if child_indent <= parent_indent {
            return Err(self.raise("Expected an indented block", child_line_no, child_indent + 1));
        }
        self.index = scan;
        self.parse_block(child_indent)
    }

    fn parse_expression(&self, text: &str, line_no: usize, column: usize) -> Result<Expr, DslError> {
        let source_line = self.lines[line_no - 1];
        ExpressionParser::parse_str(text, line_no, source_line, column)
    }
}

fn parse_for_header(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("for ")?;
    let rest = rest.trim_start();
    let id_end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
    if id_end == 0 {
        return None;
    }
    let var_name = &rest[..id_end];
    let after_name = rest[id_end..].trim_start();
    let after_in = after_name.strip_prefix("in ")?;
    let after_in = after_in.trim_start();
    let trimmed = text.trim_end();
    if !trimmed.ends_with(':') {
        return None;
    }
    let iterable_text = after_in.strip_suffix(':')?.trim();
    if iterable_text.is_empty() {
        return None;
    }
    Some((var_name, iterable_text))
}

fn parse_if_header<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    let trimmed = text.trim_end();
    if !trimmed.ends_with(':') {
        return None;
    }
    let cond = rest.strip_suffix(':')?.trim();
    if cond.is_empty() {
        None
    } else {
        Some(cond)
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if IDENTIFIER_START(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Finds the index of the top-level `=` that marks an assignment, ignoring
/// `==`, `!=`, `<=`, `>=` and anything inside brackets/strings. Returns
/// `None` if this is not an assignment statement.
fn find_assignment(text: &str) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();
    for (idx, &ch) in chars.iter().enumerate() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
                continue;
            }
            if ch == '\\' {
                escaped = true;
                continue;
            }
            if ch == q {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = (depth - 1).max(0),
            '=' if depth == 0 => {
                let prev = if idx > 0 { Some(chars[idx - 1]) } else { None };
                let next = chars.get(idx + 1).copied();
                if matches!(prev, Some('=') | Some('!') | Some('<') | Some('>')) || next == Some('=') {
                    continue;
                }
                return Some(idx);
            }
            _ => {}
        }
    }
    None
}

fn delimiter_balance(text: &str) -> i32 {
    let mut balance = 0;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
                continue;
            }
            if ch == '\\' {
                escaped = true;
                continue;
            }
            if ch == q {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_quote = Some(ch),
            '(' | '[' => balance += 1,
            ')' | ']' => balance -= 1,
            _ => {}
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_in_indentation_are_rejected() {
        let source = "if true:\n\tprint(1)\n";
        let err = Parser::parse(source).unwrap_err();
        match err {
            DslError::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 1);
            }
            other => panic!("expected Syntax error, got {other:?}"),
        }
    }

    #[test]
    fn parses_simple_assignment() {
        let program = Parser::parse("x = 1\n").unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn parses_for_and_if_blocks() {
        let source = "for x in [1, 2]:\n  if x == 1:\n    y = x\n  else:\n    y = 0\n";
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn elif_after_else_is_error() {
        let source = "if a:\n  x = 1\nelse:\n  x = 2\nelif b:\n  x = 3\n";
        assert!(Parser::parse(source).is_err());
    }

    #[test]
    fn multiple_else_is_error() {
        let source = "if a:\n  x = 1\nelse:\n  x = 2\nelse:\n  x = 3\n";
        assert!(Parser::parse(source).is_err());
    }

    #[test]
    fn bracket_continuation_across_lines() {
        let source = "xs = [1,\n  2,\n  3]\n";
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn comment_only_lines_are_skipped() {
        let source = "# a comment\nx = 1  # trailing\n";
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        let source = "x = \"a#b\"\n";
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn syntax_error_reports_location_for_malformed_for() {
        let source = "for file in Directory('.')\n    print(file)\n";
        let err = Parser::parse(source).unwrap_err();
        match err {
            DslError::Syntax { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column >= 1);
            }
            other => panic!("expected Syntax error, got {other:?}"),
        }
    }
}

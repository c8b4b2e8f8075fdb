//! Runtime value representation: a tagged union over everything a FilesDSL
//! expression can evaluate to, plus the total functions (arithmetic,
//! comparison, truthiness) the evaluator needs over it.

use std::fmt;
use std::rc::Rc;

use crate::error::DslError;
use crate::runtime::directory::Directory;
use crate::runtime::file::File;

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
    Seq(Vec<Value>),
    Dir(Rc<Directory>),
    File(Rc<File>),
    Builtin(Builtin),
    /// A method bound to a `Directory`/`File` receiver, produced by
    /// attribute access (`f.read`) and invoked by a following `(...)` call.
    Method(MethodReceiver, String),
}

#[derive(Clone)]
pub enum MethodReceiver {
    Dir(Rc<Directory>),
    File(Rc<File>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Directory,
    File,
    Len,
    Print,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::Seq(_) => "list",
            Value::Dir(_) => "Directory",
            Value::File(_) => "File",
            Value::Builtin(_) => "builtin",
            Value::Method(..) => "method",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Seq(items) => !items.is_empty(),
            Value::Dir(_) | Value::File(_) | Value::Builtin(_) | Value::Method(..) => true,
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, DslError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Seq(a), Value::Seq(b)) => {
                let mut out = a.clone();
                out.extend(b.clone());
                Ok(Value::Seq(out))
            }
            _ => Err(type_error("+", self, other)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, DslError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            _ => Err(type_error("-", self, other)),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, DslError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            _ => Err(type_error("*", self, other)),
        }
    }

    /// Integer division, truncated toward zero (Rust's native `/` for
    /// signed integers already has this behavior, matching the host
    /// platform convention the specification calls for).
    pub fn div(&self, other: &Value) -> Result<Value, DslError> {
        match (self, other) {
            (Value::Int(_), Value::Int(0)) => Err(DslError::runtime("Division by zero")),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
            _ => Err(type_error("/", self, other)),
        }
    }

    pub fn rem(&self, other: &Value) -> Result<Value, DslError> {
        match (self, other) {
            (Value::Int(_), Value::Int(0)) => Err(DslError::runtime("Division by zero")),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a % b)),
            _ => Err(type_error("%", self, other)),
        }
    }

    pub fn neg(&self) -> Result<Value, DslError> {
        match self {
            Value::Int(n) => Ok(Value::Int(-n)),
            other => Err(DslError::runtime(format!(
                "Unary '-' requires an integer, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    /// Standard ordering on integers and strings; `None` for anything else
    /// (mixed types, or types with no defined ordering).
    pub fn partial_cmp(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    pub fn values_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.values_equal(y))
            }
            (Value::Dir(a), Value::Dir(b)) => Rc::ptr_eq(a, b),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Renders the value the way `print()` does: sequences as
    /// `[e1, e2, ...]`, booleans as `true`/`false`, directories/files as
    /// their display path.
    pub fn render(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Seq(items) => {
                let rendered: Vec<String> = items.iter().map(Value::render_inline).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Dir(dir) => dir.display_path(),
            Value::File(file) => file.display_path(),
            Value::Builtin(b) => format!("<builtin {b:?}>"),
            Value::Method(_, name) => format!("<bound method {name}>"),
        }
    }

    /// Like `render`, but quotes strings — used for elements nested inside
    /// a rendered sequence so `print([1, "a"])` reads as `[1, "a"]`.
    fn render_inline(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            other => other.render(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.render())
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> DslError {
    DslError::runtime(format!(
        "Unsupported operand types for '{op}': {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Seq(vec![]).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
    }

    #[test]
    fn string_concat_and_int_add() {
        let a = Value::Str("a".into());
        let b = Value::Str("b".into());
        match a.add(&b).unwrap() {
            Value::Str(s) => assert_eq!(s, "ab"),
            _ => panic!("expected string"),
        }
        match Value::Int(2).add(&Value::Int(3)).unwrap() {
            Value::Int(n) => assert_eq!(n, 5),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn division_truncates_toward_zero() {
        match Value::Int(-7).div(&Value::Int(2)).unwrap() {
            Value::Int(n) => assert_eq!(n, -3),
            _ => panic!("expected int"),
        }
        match Value::Int(7).div(&Value::Int(-2)).unwrap() {
            Value::Int(n) => assert_eq!(n, -3),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        assert!(Value::Int(1).div(&Value::Int(0)).is_err());
        assert!(Value::Int(1).rem(&Value::Int(0)).is_err());
    }

    #[test]
    fn mixed_type_comparison_is_none() {
        assert!(Value::Int(1).partial_cmp(&Value::Str("1".into())).is_none());
    }

    #[test]
    fn seq_concat_with_plus() {
        let a = Value::Seq(vec![Value::Int(1)]);
        let b = Value::Seq(vec![Value::Int(2)]);
        match a.add(&b).unwrap() {
            Value::Seq(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected seq"),
        }
    }

    #[test]
    fn render_formats_sequence_and_bool() {
        let seq = Value::Seq(vec![Value::Int(1), Value::Str("a".into()), Value::Bool(true)]);
        assert_eq!(seq.render(), "[1, \"a\", true]");
    }
}

//! Abstract syntax tree: a tagged union over statements and expressions,
//! each node carrying its source location for error reporting.

use crate::error::SourceLocation;

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        name: String,
        expr: Expr,
        loc: SourceLocation,
    },
    ExprStmt {
        expr: Expr,
        loc: SourceLocation,
    },
    For {
        var_name: String,
        iterable: Expr,
        body: Vec<Stmt>,
        loc: SourceLocation,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
        loc: SourceLocation,
    },
}

impl Stmt {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Assign { loc, .. }
            | Stmt::ExprStmt { loc, .. }
            | Stmt::For { loc, .. }
            | Stmt::If { loc, .. } => *loc,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Literal,
        loc: SourceLocation,
    },
    Name {
        id: String,
        loc: SourceLocation,
    },
    List {
        items: Vec<ListItem>,
        loc: SourceLocation,
    },
    Attr {
        obj: Box<Expr>,
        name: String,
        loc: SourceLocation,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        loc: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        loc: SourceLocation,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        loc: SourceLocation,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
        loc: SourceLocation,
    },
}

/// A list item is either a plain expression or a `start:end` range — valid
/// only directly inside a list literal.
#[derive(Debug, Clone)]
pub enum ListItem {
    Item(Expr),
    Range {
        start: Expr,
        end: Expr,
        loc: SourceLocation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Expr {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Literal { loc, .. }
            | Expr::Name { loc, .. }
            | Expr::List { loc, .. }
            | Expr::Attr { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Compare { loc, .. } => *loc,
        }
    }
}

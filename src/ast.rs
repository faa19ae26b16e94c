//! The parse-tree node shapes the code generator consumes. This is the
//! interface boundary described in §6: the lexer and parser are
//! "external collaborators" in the distilled core, but this crate
//! supplies its own (see `lexer` and `parser`) to produce values of
//! these types, since no upstream grammar survived distillation.
//!
//! Recursive nodes are linked with `Rc`, the same sharing discipline the
//! teacher compiler uses for its own intermediate trees (MIR `Ty`/`Expr`
//! nodes are `Rc`-wrapped so translation can memoize and clone cheaply
//! instead of deep-copying subtrees).

use std::rc::Rc;

use crate::types::Dims;

/// A type as written in source: `int`, or `T *`, nestable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub ptr_depth: u32,
}

impl TypeExpr {
    #[must_use]
    pub fn int() -> Self { TypeExpr { ptr_depth: 0 } }
}

/// `top` — function definitions followed by top-level statements
/// (which form the body of a synthesized `main`).
#[derive(Debug)]
pub struct Top {
    pub funcs: Vec<Func>,
    pub top_level_stmts: Vec<Stmt>,
}

/// `func` — return type, name, parameter list, statement list.
#[derive(Debug)]
pub struct Func {
    pub ret_ty: TypeExpr,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A single `(type id)` entry in a parameter list.
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeExpr,
    pub name: String,
}

/// A statement.
#[derive(Debug)]
pub enum Stmt {
    /// `T id [dim]* (= expr)?`
    Decl { ty: TypeExpr, name: String, dims: Dims, init: Option<Expr> },
    /// `lvalue = expr ;`
    Assign { target: LValue, value: Expr },
    /// `return expr ;`
    Return(Expr),
    /// `if (cond) then_branch (else else_branch)?`
    If { cond: Expr, then_branch: Rc<Stmt>, else_branch: Option<Rc<Stmt>> },
    /// `{ stmt* }`
    Block(Vec<Stmt>),
    /// `expr ;`
    ExprStmt(Expr),
}

/// An expression.
#[derive(Debug)]
pub enum Expr {
    /// An integer literal.
    Int(i64),
    /// A bare identifier reference.
    Ident(String),
    /// `id(args...)`
    Call { name: String, args: Vec<Expr> },
    /// `(T) atom`
    Cast { ty: TypeExpr, expr: Rc<Expr> },
    /// `a[i]`
    Index { base: Rc<Expr>, index: Rc<Expr> },
    /// `- e`
    Neg(Rc<Expr>),
    /// `* e`
    Deref(Rc<Expr>),
    /// `& e`
    Addr(Rc<Expr>),
    /// `lhs op rhs` for `+ - * / %`
    Binary { op: BinOp, lhs: Rc<Expr>, rhs: Rc<Expr> },
    /// `lhs op rhs` for `== != < <= > >=`
    Relational { op: RelOp, lhs: Rc<Expr>, rhs: Rc<Expr> },
}

/// The expression sub-language that yields an address: the receiver of
/// assignment and indexed stores.
#[derive(Debug)]
pub enum LValue {
    /// A bare identifier.
    Name(String),
    /// `*e`
    Deref(Expr),
    /// `lv[i]`
    Index { base: Rc<LValue>, index: Expr },
}

/// `+ - * / %`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp { Add, Sub, Mul, Div, Mod }

/// `== != < <= > >=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp { Eq, Ne, Lt, Le, Gt, Ge }

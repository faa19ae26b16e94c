//! A hand-written recursive-descent parser, producing the `ast` node
//! shapes from a token stream. Stands in for the external, ANTLR-
//! generated parser the distilled core spec assumes (§1).

use std::rc::Rc;

use if_chain::if_chain;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::Token;
use crate::types::Dims;

pub struct Parser<'t> {
    toks: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    #[must_use]
    pub fn new(toks: &'t [Token]) -> Self { Parser { toks, pos: 0 } }

    fn peek(&self) -> &Token { &self.toks[self.pos] }

    fn peek_at(&self, ahead: usize) -> &Token {
        self.toks.get(self.pos + ahead).unwrap_or(&Token::Eof)
    }

    fn bump(&mut self) -> Token {
        let t = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() { self.pos += 1; }
        t
    }

    fn expect(&mut self, want: &Token) -> Result<()> {
        if self.peek() == want { self.bump(); Ok(()) }
        else { Err(Error::Parse(format!("expected {want}, found {}", self.peek()))) }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.bump() {
            Token::Ident(s) => Ok(s),
            other => Err(Error::Parse(format!("expected identifier, found {other}"))),
        }
    }

    /// `int` followed by zero or more `*`.
    fn parse_type(&mut self) -> Result<TypeExpr> {
        self.expect(&Token::KwInt)?;
        let mut ptr_depth = 0;
        while self.peek() == &Token::Star {
            self.bump();
            ptr_depth += 1;
        }
        Ok(TypeExpr { ptr_depth })
    }

    /// `top` — function definitions, then the top-level statement
    /// sequence that forms the body of a synthesized `main`.
    pub fn parse_top(&mut self) -> Result<Top> {
        let mut funcs = Vec::new();
        let mut top_level_stmts = Vec::new();
        while self.peek() != &Token::Eof {
            if self.looks_like_func_def() {
                funcs.push(self.parse_func()?);
            } else {
                top_level_stmts.push(self.parse_stmt()?);
            }
        }
        Ok(Top { funcs, top_level_stmts })
    }

    /// A function definition and a top-level statement both start with
    /// `int`/`int *...` then an identifier; they're told apart by
    /// whether a `(` follows the identifier.
    fn looks_like_func_def(&self) -> bool {
        let mut i = 1; // past `int`
        while self.peek_at(i) == &Token::Star { i += 1; }
        matches!(self.peek_at(i), Token::Ident(_)) && self.peek_at(i + 1) == &Token::LParen
    }

    fn parse_func(&mut self) -> Result<Func> {
        let ret_ty = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                params.push(Param { ty, name });
                if self.peek() == &Token::Comma { self.bump(); } else { break }
            }
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let mut body = Vec::new();
        while self.peek() != &Token::RBrace {
            body.push(self.parse_stmt()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(Func { ret_ty, name, params, body })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.peek() {
            Token::KwInt => self.parse_decl(),
            Token::KwReturn => {
                self.bump();
                let e = self.parse_expr()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Return(e))
            }
            Token::KwIf => self.parse_if(),
            Token::LBrace => {
                self.bump();
                let mut stmts = Vec::new();
                while self.peek() != &Token::RBrace {
                    stmts.push(self.parse_stmt()?);
                }
                self.expect(&Token::RBrace)?;
                Ok(Stmt::Block(stmts))
            }
            _ if self.looks_like_assignment() => self.parse_assign(),
            _ => {
                let e = self.parse_expr()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::ExprStmt(e))
            }
        }
    }

    fn parse_decl(&mut self) -> Result<Stmt> {
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        let mut dims = Dims::new();
        while self.peek() == &Token::LBracket {
            self.bump();
            let n = match self.bump() {
                Token::Int(n) if n > 0 => n,
                other => return Err(Error::Parse(format!("array dimension must be a positive integer literal, found {other}"))),
            };
            self.expect(&Token::RBracket)?;
            dims.push(u32::try_from(n).map_err(|_| Error::Parse("array dimension out of range".into()))?);
        }
        let init = if self.peek() == &Token::Assign {
            self.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&Token::Semi)?;
        Ok(Stmt::Decl { ty, name, dims, init })
    }

    /// An assignment statement's target is always an lvalue-shaped
    /// prefix (`name`, `*expr`, `lv[expr]`) followed directly by `=`;
    /// an ordinary expression statement never starts that way unless it
    /// is itself an assignment, so scanning ahead for a top-level `=`
    /// before the statement's `;` disambiguates the two.
    fn looks_like_assignment(&self) -> bool {
        let mut depth = 0i32;
        let mut i = 0;
        loop {
            match self.peek_at(i) {
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket => depth -= 1,
                Token::Assign if depth == 0 => return true,
                Token::Semi | Token::Eof if depth <= 0 => return false,
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_assign(&mut self) -> Result<Stmt> {
        let target = self.parse_lvalue()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_expr()?;
        self.expect(&Token::Semi)?;
        Ok(Stmt::Assign { target, value })
    }

    fn parse_lvalue(&mut self) -> Result<LValue> {
        let mut lv = match self.peek().clone() {
            Token::Star => {
                self.bump();
                LValue::Deref(self.parse_unary()?)
            }
            Token::Ident(name) => { self.bump(); LValue::Name(name) }
            other => return Err(Error::Parse(format!("expected lvalue, found {other}"))),
        };
        while self.peek() == &Token::LBracket {
            self.bump();
            let index = self.parse_expr()?;
            self.expect(&Token::RBracket)?;
            lv = LValue::Index { base: Rc::new(lv), index };
        }
        Ok(lv)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.expect(&Token::KwIf)?;
        self.expect(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let then_branch = Rc::new(self.parse_stmt()?);
        let else_branch = if self.peek() == &Token::KwElse {
            self.bump();
            Some(Rc::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn parse_expr(&mut self) -> Result<Expr> { self.parse_relational() }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => RelOp::Eq,
                Token::Ne => RelOp::Ne,
                Token::Lt => RelOp::Lt,
                Token::Le => RelOp::Le,
                Token::Gt => RelOp::Gt,
                Token::Ge => RelOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            lhs = Expr::Relational { op, lhs: Rc::new(lhs), rhs: Rc::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, lhs: Rc::new(lhs), rhs: Rc::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Rc::new(lhs), rhs: Rc::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Token::Minus => { self.bump(); Ok(Expr::Neg(Rc::new(self.parse_unary()?))) }
            Token::Star => { self.bump(); Ok(Expr::Deref(Rc::new(self.parse_unary()?))) }
            Token::Amp => { self.bump(); Ok(Expr::Addr(Rc::new(self.parse_unary()?))) }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut e = self.parse_atom()?;
        while self.peek() == &Token::LBracket {
            self.bump();
            let index = self.parse_expr()?;
            self.expect(&Token::RBracket)?;
            e = Expr::Index { base: Rc::new(e), index: Rc::new(index) };
        }
        Ok(e)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        if_chain! {
            if self.peek() == &Token::LParen;
            if self.peek_at(1) == &Token::KwInt;
            then {
                self.bump();
                let ty = self.parse_type()?;
                self.expect(&Token::RParen)?;
                let expr = self.parse_unary()?;
                return Ok(Expr::Cast { ty, expr: Rc::new(expr) });
            }
        }
        match self.bump() {
            Token::Int(n) => Ok(Expr::Int(n)),
            Token::LParen => {
                let e = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Token::Ident(name) => {
                if self.peek() == &Token::LParen {
                    self.bump();
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek() == &Token::Comma { self.bump(); } else { break }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            other => Err(Error::Parse(format!("expected expression, found {other}"))),
        }
    }
}

/// Lex then parse a whole source file into a `Top`.
pub fn parse_source(src: &str) -> Result<Top> {
    let toks = crate::lexer::lex(src)?;
    Parser::new(&toks).parse_top()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_1() {
        let top = parse_source("int main() { return 1 + 2 * 3; }").unwrap();
        assert_eq!(top.funcs.len(), 1);
        assert_eq!(top.funcs[0].name, "main");
    }

    #[test]
    fn parses_function_call() {
        let top = parse_source(
            "int f(int a, int b) { return a - b; } int main() { return f(10, 3); }"
        ).unwrap();
        assert_eq!(top.funcs.len(), 2);
        assert_eq!(top.funcs[0].params.len(), 2);
    }

    #[test]
    fn parses_array_decl_and_indexing() {
        let top = parse_source(
            "int main() { int a[3]; a[0]=1; a[1]=2; a[2]=4; return a[0]+a[1]+a[2]; }"
        ).unwrap();
        assert_eq!(top.funcs.len(), 1);
        assert_eq!(top.funcs[0].body.len(), 5);
    }

    #[test]
    fn parses_pointer_decl_and_cast() {
        let top = parse_source("int main() { int x; int *p; x = (int)9; p = &x; return *p; }").unwrap();
        assert_eq!(top.funcs.len(), 1);
        assert_eq!(top.funcs[0].body.len(), 4);
    }

    #[test]
    fn rejects_non_literal_array_dimension() {
        assert!(parse_source("int main() { int n; int a[n]; return 0; }").is_err());
    }
}

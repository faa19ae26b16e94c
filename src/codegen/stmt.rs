//! Statement and declaration translation (§4.5). Every statement
//! leaves `sp` exactly where it found it; only `Decl` and `Block`
//! permanently (for the rest of the enclosing scope) grow the frame.

use super::{base_type, CodeGen};
use crate::ast::{Expr, LValue, Stmt, TypeExpr};
use crate::error::{Error, Result};
use crate::types::{self, Dims};

impl CodeGen {
    pub(super) fn translate_stmt(&mut self, s: &Stmt) -> Result<()> {
        match s {
            Stmt::Decl { ty, name, dims, init } => self.translate_decl(ty, name, dims, init.as_ref()),
            Stmt::Assign { target, value } => self.translate_assign(target, value),
            Stmt::Return(e) => self.translate_return(e),
            Stmt::If { cond, then_branch, else_branch } => {
                self.translate_if(cond, then_branch, else_branch.as_deref())
            }
            Stmt::Block(stmts) => self.translate_block(stmts),
            Stmt::ExprStmt(e) => {
                self.translate_expr(e)?;
                self.emitter.pop_n(1);
                Ok(())
            }
        }
    }

    fn translate_decl(
        &mut self,
        ty: &TypeExpr,
        name: &str,
        dims: &Dims,
        init: Option<&Expr>,
    ) -> Result<()> {
        let declared = if dims.is_empty() {
            base_type(ty)
        } else {
            base_type(ty).to_array(dims.clone())
        };

        if dims.is_empty() {
            if let Some(e) = init {
                let t = self.translate_expr(e)?;
                types::assignable(&declared, &t)?;
            } else {
                self.emitter.push_imm(0);
            }
        } else {
            if init.is_some() {
                return Err(Error::Type(format!("array `{name}` cannot have an initializer")));
            }
            self.emitter.comment(&format!("alloc {name}: {declared}"));
            let bytes = declared.size_of();
            self.emitter.reserve(bytes);
            for word in 0..bytes / 8 {
                self.emitter.emit(&format!("\tsd zero, {}(sp)", word * 8));
            }
        }

        self.scopes.insert(name, declared)?;
        Ok(())
    }

    fn translate_assign(&mut self, target: &LValue, value: &Expr) -> Result<()> {
        let target_ty = self.translate_lvalue(target)?;
        let value_ty = self.translate_expr(value)?;
        types::assignable(&target_ty, &value_ty)?;
        self.emitter.pop_reg("t2");
        self.emitter.pop_reg("t1");
        self.emitter.emit("\tsd t2, 0(t1)");
        Ok(())
    }

    fn translate_return(&mut self, e: &Expr) -> Result<()> {
        let t = self.translate_expr(e)?;
        types::assignable(&self.cur_ret_ty, &t)?;
        self.emitter.pop_reg("a0");
        let epilogue = self
            .epilogue_label
            .clone()
            .expect("translate_return called outside of compile_func");
        self.emitter.emit(&format!("\tj {epilogue}"));
        Ok(())
    }

    fn translate_if(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Result<()> {
        let t = self.translate_expr(cond)?;
        if !t.is_int() {
            return Err(Error::Type(format!("`if` condition must be int, found {t}")));
        }
        self.emitter.pop_reg("t0");
        match else_branch {
            Some(else_stmt) => {
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.emitter.emit(&format!("\tbeqz t0, {else_label}"));
                self.translate_stmt(then_branch)?;
                self.emitter.emit(&format!("\tj {end_label}"));
                self.emitter.emit(&format!("{else_label}:"));
                self.translate_stmt(else_stmt)?;
                self.emitter.emit(&format!("{end_label}:"));
            }
            None => {
                let end_label = self.fresh_label();
                self.emitter.emit(&format!("\tbeqz t0, {end_label}"));
                self.translate_stmt(then_branch)?;
                self.emitter.emit(&format!("{end_label}:"));
            }
        }
        Ok(())
    }

    fn translate_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.scopes.enter_scope();
        for s in stmts {
            self.translate_stmt(s)?;
        }
        let freed = self.scopes.exit_scope();
        debug_assert_eq!(freed % 8, 0, "every declared size is a multiple of 8");
        self.emitter.pop_n(freed / 8);
        Ok(())
    }
}

//! Expression translation (§4.3) and its `&`-address variant. Every
//! arm leaves exactly one 8-byte value on `sp` and returns that value's
//! static type.

use itertools::Itertools;

use super::{base_type, CodeGen};
use crate::ast::{BinOp, Expr, LValue, RelOp};
use crate::error::{Error, Result};
use crate::types::{self, Type};

/// The type one step of `[...]` indexing steps down to, from a base of
/// type `base_ty`: the next array rank, or a pointer's pointee.
fn index_step(base_ty: &Type) -> Result<Type> {
    if base_ty.is_array() {
        base_ty.next_array_level()
    } else if base_ty.is_pointer() {
        base_ty.unwrap_ptr()
    } else {
        Err(Error::Type(format!("cannot index non-array, non-pointer type {base_ty}")))
    }
}

impl CodeGen {
    pub(super) fn translate_expr(&mut self, e: &Expr) -> Result<Type> {
        match e {
            Expr::Int(n) => {
                self.emitter.push_imm(*n);
                Ok(Type::int())
            }
            Expr::Ident(name) => {
                let sym = self.scopes.lookup(name)?.clone();
                let off = self.fp_offset(sym.offset);
                if sym.ty.is_array() {
                    self.emitter.emit(&format!("\taddi t0, fp, {off}"));
                    self.emitter.push_reg("t0");
                    Ok(sym.ty.decay())
                } else {
                    self.emitter.emit(&format!("\tld t0, {off}(fp)"));
                    self.emitter.push_reg("t0");
                    Ok(sym.ty)
                }
            }
            Expr::Call { name, args } => self.translate_call(name, args),
            Expr::Cast { ty, expr } => {
                // Every value is a bit-identical 8 bytes; a cast only
                // relabels the static type, no instructions needed.
                self.translate_expr(expr)?;
                Ok(base_type(ty))
            }
            Expr::Index { base, index } => self.translate_index(base, index),
            Expr::Neg(inner) => {
                let t = self.translate_expr(inner)?;
                types::unary_int(&t)?;
                self.emitter.pop_reg("t0");
                self.emitter.emit("\tneg t0, t0");
                self.emitter.push_reg("t0");
                Ok(Type::int())
            }
            Expr::Deref(inner) => {
                let t = self.translate_expr(inner)?;
                let result = types::deref(&t)?;
                self.emitter.pop_reg("t0");
                self.emitter.emit("\tld t0, 0(t0)");
                self.emitter.push_reg("t0");
                Ok(result)
            }
            Expr::Addr(inner) => self.translate_addr(inner),
            Expr::Binary { op, lhs, rhs } => self.translate_binary(*op, lhs, rhs),
            Expr::Relational { op, lhs, rhs } => self.translate_relational(*op, lhs, rhs),
        }
    }

    /// `lv` — the address-yielding sub-language (§4.4). Never decays an
    /// array's type: indexing needs the original dimensions.
    pub(super) fn translate_lvalue(&mut self, lv: &LValue) -> Result<Type> {
        match lv {
            LValue::Name(name) => {
                let sym = self.scopes.lookup(name)?.clone();
                let off = self.fp_offset(sym.offset);
                self.emitter.emit(&format!("\taddi t0, fp, {off}"));
                self.emitter.push_reg("t0");
                Ok(sym.ty)
            }
            LValue::Deref(e) => {
                let t = self.translate_expr(e)?;
                types::deref(&t)
            }
            LValue::Index { base, index } => {
                let base_ty = self.translate_lvalue(base)?;
                let idx_ty = self.translate_expr(index)?;
                if !idx_ty.is_int() {
                    return Err(Error::Type(format!("array index must be int, found {idx_ty}")));
                }
                let elem_ty = index_step(&base_ty)?;
                self.emit_index_arith(elem_ty.size_of());
                Ok(elem_ty)
            }
        }
    }

    /// `base[index]` as an rvalue: loads the element unless indexing
    /// stops partway through a multi-dimensional array, in which case
    /// the partial address (still array-typed) is left on the stack for
    /// a further `[...]` to consume.
    fn translate_index(&mut self, base: &Expr, index: &Expr) -> Result<Type> {
        let base_ty = self.translate_index_base(base)?;
        let idx_ty = self.translate_expr(index)?;
        if !idx_ty.is_int() {
            return Err(Error::Type(format!("array index must be int, found {idx_ty}")));
        }
        let elem_ty = index_step(&base_ty)?;
        self.emit_index_arith(elem_ty.size_of());
        if elem_ty.is_array() {
            Ok(elem_ty)
        } else {
            self.emitter.pop_reg("t1");
            self.emitter.emit("\tld t1, 0(t1)");
            self.emitter.push_reg("t1");
            Ok(elem_ty)
        }
    }

    /// Translate the immediate base of `[...]`, preserving its full
    /// (un-decayed) type so the caller can compute the right stride.
    fn translate_index_base(&mut self, e: &Expr) -> Result<Type> {
        match e {
            Expr::Ident(name) => {
                let sym = self.scopes.lookup(name)?.clone();
                let off = self.fp_offset(sym.offset);
                if sym.ty.is_array() {
                    self.emitter.emit(&format!("\taddi t0, fp, {off}"));
                } else if sym.ty.is_pointer() {
                    self.emitter.emit(&format!("\tld t0, {off}(fp)"));
                } else {
                    return Err(Error::Type(format!(
                        "cannot index non-array, non-pointer type {}",
                        sym.ty
                    )));
                }
                self.emitter.push_reg("t0");
                Ok(sym.ty)
            }
            Expr::Index { base, index } => self.translate_index(base, index),
            other => {
                let t = self.translate_expr(other)?;
                if t.is_array() || t.is_pointer() {
                    Ok(t)
                } else {
                    Err(Error::Type(format!("cannot index type {t}")))
                }
            }
        }
    }

    /// Pop `[..., base_addr, index]`, scale the index by `elem_size`,
    /// add it to the base, and push the resulting address.
    fn emit_index_arith(&mut self, elem_size: u32) {
        self.emitter.pop_reg("t2");
        self.emitter.pop_reg("t1");
        self.emitter.emit(&format!("\tli t3, {elem_size}"));
        self.emitter.emit("\tmul t2, t2, t3");
        self.emitter.emit("\tadd t1, t1, t2");
        self.emitter.push_reg("t1");
    }

    /// `&e`: an identifier, an indexing expression, or `&*e` (which
    /// cancels to `e`'s own value).
    fn translate_addr(&mut self, e: &Expr) -> Result<Type> {
        match e {
            Expr::Ident(name) => {
                let sym = self.scopes.lookup(name)?.clone();
                let off = self.fp_offset(sym.offset);
                self.emitter.emit(&format!("\taddi t0, fp, {off}"));
                self.emitter.push_reg("t0");
                // An array's address is the same word an rvalue read of it
                // would decay to; wrap_ptr over its raw dims would instead
                // describe an array of pointers, a type the indexer can't
                // unwind back to the element.
                if sym.ty.is_array() { Ok(sym.ty.decay()) } else { Ok(sym.ty.wrap_ptr()) }
            }
            Expr::Index { base, index } => {
                let base_ty = self.translate_index_base(base)?;
                let idx_ty = self.translate_expr(index)?;
                if !idx_ty.is_int() {
                    return Err(Error::Type(format!("array index must be int, found {idx_ty}")));
                }
                let elem_ty = index_step(&base_ty)?;
                self.emit_index_arith(elem_ty.size_of());
                Ok(elem_ty.wrap_ptr())
            }
            Expr::Deref(inner) => self.translate_expr(inner),
            _ => Err(Error::Type("`&` requires an addressable operand".into())),
        }
    }

    fn translate_call(&mut self, name: &str, args: &[Expr]) -> Result<Type> {
        let sig = self
            .signatures
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Call(format!("call to undeclared function `{name}`")))?;
        if args.len() != sig.param_types.len() {
            return Err(Error::Call(format!(
                "`{name}` expects {} argument(s) of type ({}), found {}",
                sig.param_types.len(),
                sig.param_types.iter().join(", "),
                args.len()
            )));
        }
        if args.len() > super::ARG_REGS.len() {
            return Err(Error::Call(format!(
                "`{name}`: calls with more than {} arguments are not supported",
                super::ARG_REGS.len()
            )));
        }
        for (i, (arg, expected)) in args.iter().zip(sig.param_types.iter()).enumerate() {
            let t = self.translate_expr(arg)?;
            if &t != expected {
                return Err(Error::Call(format!(
                    "`{name}` argument {i}: expected {expected}, found {t}"
                )));
            }
            self.emitter.pop_reg(super::ARG_REGS[i]);
        }
        self.emitter.comment(&format!("call {name}"));
        self.emitter.emit(&format!("\tcall {name}"));
        self.emitter.push_reg("a0");
        Ok(sig.return_type)
    }

    fn translate_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Type> {
        let t1 = self.translate_expr(lhs)?;
        let t2 = self.translate_expr(rhs)?;
        self.emitter.pop_reg("t2");
        self.emitter.pop_reg("t1");

        let asm_op = match op {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "rem",
        };

        match op {
            BinOp::Mul | BinOp::Div | BinOp::Mod => {
                types::binary_int(&t1, &t2)?;
                self.emitter.emit(&format!("\t{asm_op} t1, t1, t2"));
                self.emitter.push_reg("t1");
                Ok(Type::int())
            }
            BinOp::Add | BinOp::Sub => {
                if let Ok(ptr_ty) = types::binary_ptr_arith(&t1, &t2) {
                    let scale = i64::from(ptr_ty.unwrap_ptr()?.size_of());
                    self.emitter.emit(&format!("\tli t3, {scale}"));
                    if t1.is_pointer() {
                        self.emitter.emit("\tmul t2, t2, t3");
                    } else {
                        self.emitter.emit("\tmul t1, t1, t3");
                    }
                    self.emitter.emit(&format!("\t{asm_op} t1, t1, t2"));
                    self.emitter.push_reg("t1");
                    Ok(ptr_ty)
                } else {
                    types::binary_int(&t1, &t2)?;
                    self.emitter.emit(&format!("\t{asm_op} t1, t1, t2"));
                    self.emitter.push_reg("t1");
                    Ok(Type::int())
                }
            }
        }
    }

    fn translate_relational(&mut self, op: RelOp, lhs: &Expr, rhs: &Expr) -> Result<Type> {
        let t1 = self.translate_expr(lhs)?;
        let t2 = self.translate_expr(rhs)?;
        types::same_type(&t1, &t2)?;
        self.emitter.pop_reg("t2");
        self.emitter.pop_reg("t1");
        match op {
            RelOp::Eq => {
                self.emitter.emit("\tsub t1, t1, t2");
                self.emitter.emit("\tseqz t1, t1");
            }
            RelOp::Ne => {
                self.emitter.emit("\tsub t1, t1, t2");
                self.emitter.emit("\tsnez t1, t1");
            }
            RelOp::Lt => self.emitter.emit("\tslt t1, t1, t2"),
            RelOp::Gt => self.emitter.emit("\tslt t1, t2, t1"),
            RelOp::Le => {
                self.emitter.emit("\tslt t1, t2, t1");
                self.emitter.emit("\txori t1, t1, 1");
            }
            RelOp::Ge => {
                self.emitter.emit("\tslt t1, t1, t2");
                self.emitter.emit("\txori t1, t1, 1");
            }
        }
        self.emitter.push_reg("t1");
        Ok(Type::int())
    }
}

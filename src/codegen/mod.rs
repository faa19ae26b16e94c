//! The syntax-directed translator: walks a parsed `ast::Top` once and
//! drives the `Emitter`, consulting `types` for the type rules and
//! `symbol::ScopeStack` for frame layout (§4.3–§4.6).
//!
//! Function frames follow the standard RISC-V frame-pointer convention:
//! a 16-byte header of saved `fp`/`ra` sits directly below `fp`, and
//! every local or parameter lives below that, at `fp - 16 - n`. The
//! `ScopeStack` itself is unaware of this header; it hands out slots
//! starting at `-8`, and `CodeGen::fp_offset` shifts them past it.

mod expr;
mod stmt;

use crate::ast::{self, TypeExpr};
use crate::emit::Emitter;
use crate::error::{Error, Result};
use crate::symbol::ScopeStack;
use crate::types::Type;

/// Argument/return registers, in calling-convention order. At most
/// eight arguments are register-passed (§4.6); a ninth is a `Call`
/// error, not a spill to the stack.
const ARG_REGS: [&str; 8] = ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"];

/// Bytes consumed by the saved `fp`/`ra` pair at the top of every frame,
/// below which the scope stack's slots begin.
const ABI_HEADER_BYTES: i32 = 16;

/// A function's calling signature, recorded once per definition and
/// consulted by every call site (§3 "Function signature").
#[derive(Debug, Clone)]
struct Signature {
    param_types: Vec<Type>,
    return_type: Type,
}

/// Convert a source-level type (`int`, with some number of `*`) to a
/// value `Type`. Source types never carry array dimensions directly;
/// those are attached separately by a declaration's `[n]` suffixes.
fn base_type(te: &TypeExpr) -> Type {
    if te.ptr_depth == 0 { Type::int() } else { Type::ptr(te.ptr_depth) }
}

/// Owns the single emitter for a whole compilation and drives the
/// translation of every function, plus the synthesized `main` that
/// wraps the program's top-level statements (§4.6).
pub struct CodeGen {
    emitter: Emitter,
    scopes: ScopeStack,
    signatures: hashbrown::HashMap<String, Signature>,
    label_counter: u32,
    /// The label the function currently being translated returns to;
    /// `None` outside of `compile_func`.
    epilogue_label: Option<String>,
    /// The return type of the function currently being translated,
    /// checked against every `return` statement's operand.
    cur_ret_ty: Type,
}

impl CodeGen {
    #[must_use]
    pub fn new(emitter: Emitter) -> Self {
        CodeGen {
            emitter,
            scopes: ScopeStack::new(),
            signatures: hashbrown::HashMap::new(),
            label_counter: 0,
            epilogue_label: None,
            cur_ret_ty: Type::int(),
        }
    }

    /// A fresh, monotonically increasing `_L<n>` label, shared across
    /// the whole program (the data model's "label counter").
    fn fresh_label(&mut self) -> String {
        let l = format!("_L{}", self.label_counter);
        self.label_counter += 1;
        tracing::trace!(label = %l, "label allocated");
        l
    }

    /// Shift a `ScopeStack`-assigned slot past the saved `fp`/`ra` header.
    fn fp_offset(&self, slot: i32) -> i32 {
        slot - ABI_HEADER_BYTES
    }

    /// Translate a whole program: every function definition, then a
    /// synthesized `main` wrapping the top-level statements.
    pub fn compile(mut self, top: &ast::Top) -> Result<()> {
        for f in &top.funcs {
            let param_types = f.params.iter().map(|p| base_type(&p.ty)).collect();
            let return_type = base_type(&f.ret_ty);
            let sig = Signature { param_types, return_type };
            if self.signatures.insert(f.name.clone(), sig).is_some() {
                return Err(Error::Call(format!("function `{}` is defined more than once", f.name)));
            }
        }
        for f in &top.funcs {
            self.compile_func(&f.name, base_type(&f.ret_ty), &f.params, &f.body)?;
        }
        self.compile_func("main", Type::int(), &[], &top.top_level_stmts)?;
        Ok(())
    }

    fn compile_func(
        &mut self,
        name: &str,
        ret_ty: Type,
        params: &[ast::Param],
        body: &[ast::Stmt],
    ) -> Result<()> {
        tracing::debug!(name, params = params.len(), return_type = %ret_ty, "compiling function");

        if params.len() > ARG_REGS.len() {
            return Err(Error::Call(format!(
                "`{name}`: {} parameters declared, more than the {} supported",
                params.len(),
                ARG_REGS.len()
            )));
        }

        self.emitter.comment(&format!("function {name}"));
        self.emitter.emit(&format!("\t.global {name}"));
        self.emitter.emit(&format!("{name}:"));
        self.emitter.emit("\taddi sp, sp, -16");
        self.emitter.emit("\tsd fp, 8(sp)");
        self.emitter.emit("\tsd ra, 0(sp)");
        self.emitter.emit("\taddi fp, sp, 16");

        self.scopes = ScopeStack::new();
        self.cur_ret_ty = ret_ty;
        // §6: "its return-exit block is labeled `<name>_exit:`".
        let epilogue = format!("{name}_exit");
        self.epilogue_label = Some(epilogue.clone());

        for (i, p) in params.iter().enumerate() {
            self.emitter.push_reg(ARG_REGS[i]);
            self.scopes.insert(&p.name, base_type(&p.ty))?;
        }

        for s in body {
            self.translate_stmt(s)?;
        }

        self.emitter.comment("implicit return 0 if control falls off the end");
        self.emitter.emit("\tli a0, 0");
        self.emitter.emit(&format!("\tj {epilogue}"));

        self.emitter.emit(&format!("{epilogue}:"));
        self.emitter.emit(&format!("\tld ra, {}(fp)", -ABI_HEADER_BYTES));
        self.emitter.emit(&format!("\tld t0, {}(fp)", -ABI_HEADER_BYTES + 8));
        self.emitter.emit("\tmv sp, fp");
        self.emitter.emit("\tmv fp, t0");
        self.emitter.emit("\tret");

        self.epilogue_label = None;
        Ok(())
    }
}

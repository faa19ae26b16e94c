//! The assembly emitter: a write-only, line-oriented text sink, plus the
//! canned `push`/`pop` sequence builders every other component composes
//! with. The emitter imposes no ordering or buffering semantics beyond
//! sequential line output (§4.1, §5).

use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Where to send emitted assembly: a file, or standard output.
enum Sink {
    File(BufWriter<File>),
    Stdout(io::Stdout),
}

/// A write-only text sink for RISC-V assembly lines.
///
/// Owns the output exclusively for its lifetime; `close` flushes and
/// releases it. No output path given ⇒ writes to standard output.
pub struct Emitter {
    sink: Sink,
    /// Whether to interleave the reference compiler's `# ...` annotation
    /// comments ahead of each generated block (on by default, matching
    /// the original upstream compiler's output).
    pub annotate: bool,
}

impl Emitter {
    /// Create an emitter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Emitter { sink: Sink::Stdout(io::stdout()), annotate: true }
    }

    /// Create an emitter writing to the file at `path`, truncating it.
    pub fn to_file(path: &std::path::Path) -> io::Result<Self> {
        let f = File::create(path)?;
        Ok(Emitter { sink: Sink::File(BufWriter::new(f)), annotate: true })
    }

    /// Write one line of assembly, terminated with a newline.
    pub fn emit(&mut self, line: &str) {
        let w: &mut dyn Write = match &mut self.sink {
            Sink::File(f) => f,
            Sink::Stdout(s) => s,
        };
        // A line sink failing mid-compilation (a broken pipe, a full
        // disk) is not a condition this compiler's error taxonomy
        // models; propagating it would thread `io::Result` through
        // every codegen call. Matching the reference compiler, a
        // write failure here is simply fatal.
        writeln!(w, "{line}").expect("failed to write assembly output");
    }

    /// Emit an optional `# ...` comment line, honoring `annotate`.
    pub fn comment(&mut self, text: &str) {
        if self.annotate {
            self.emit(&format!("# {text}"));
        }
    }

    /// Flush and release the output sink.
    pub fn close(&mut self) {
        match &mut self.sink {
            Sink::File(f) => { let _ = f.flush(); }
            Sink::Stdout(s) => { let _ = s.flush(); }
        }
    }

    /// The canonical "push an immediate" sequence.
    pub fn push_imm(&mut self, imm: i64) {
        self.comment(&format!("push {imm}"));
        self.emit(&format!("\tli t1, {imm}"));
        self.push_reg_raw("t1");
    }

    /// The canonical "push a register" sequence: `addi sp,sp,-8 ; sd <reg>,0(sp)`.
    pub fn push_reg(&mut self, reg: &str) {
        self.comment(&format!("push {reg}"));
        self.push_reg_raw(reg);
    }

    fn push_reg_raw(&mut self, reg: &str) {
        self.emit("\taddi sp, sp, -8");
        self.emit(&format!("\tsd {reg}, 0(sp)"));
    }

    /// The canonical "pop into a register" sequence: `ld <reg>,0(sp) ; addi sp,sp,8`.
    pub fn pop_reg(&mut self, reg: &str) {
        self.emit(&format!("\tld {reg}, 0(sp)"));
        self.emit("\taddi sp, sp, 8");
    }

    /// The canonical "pop N words without reading them" sequence:
    /// `addi sp,sp,8*n`.
    pub fn pop_n(&mut self, n: u32) {
        if n > 0 {
            self.emit(&format!("\taddi sp, sp, {}", 8 * i64::from(n)));
        }
    }

    /// Reserve `bytes` of stack space without storing a value: an
    /// uninitialized array declaration's allocation.
    pub fn reserve(&mut self, bytes: u32) {
        if bytes > 0 {
            self.emit(&format!("\taddi sp, sp, -{bytes}"));
        }
    }
}

impl Drop for Emitter {
    fn drop(&mut self) { self.close(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn capture(f: impl FnOnce(&mut Emitter)) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.s");
        {
            let mut e = Emitter::to_file(&path).unwrap();
            e.annotate = false;
            f(&mut e);
        }
        let mut s = String::new();
        File::open(&path).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn push_pop_are_balanced_in_text() {
        let out = capture(|e| {
            e.push_imm(5);
            e.pop_reg("t1");
        });
        assert_eq!(out.matches("addi sp, sp, -8").count(), 1);
        assert_eq!(out.matches("addi sp, sp, 8").count(), 1);
    }

    #[test]
    fn pop_n_zero_emits_nothing() {
        let out = capture(|e| e.pop_n(0));
        assert!(out.is_empty());
    }

    #[test]
    fn reserve_emits_one_negative_adjustment() {
        let out = capture(|e| e.reserve(24));
        assert_eq!(out.trim(), "addi sp, sp, -24");
    }
}

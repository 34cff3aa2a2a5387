//! Execution context stack
//!
//! The runtime is single-threaded and cooperative: exactly one context frame
//! executes at a time, and nested invocations (host calls script, script
//! calls a native function, which calls back into script) push and pop
//! frames in strict LIFO order. Popping a frame restores the caller's
//! program, program counter, stack base and operand-stack pointer exactly as
//! they were before the push, on both normal return and exceptional exit.

use std::rc::Rc;

use crate::program::{CompiledProgram, ScopeRef};
use crate::value::{CheapClone, JsString, JsValue};

/// One suspended invocation: the caller's state saved at a push site.
#[derive(Debug)]
pub struct ContextFrame {
    /// Display name of the invocation that is now active (for stack traces)
    name: JsString,
    prg: Option<Rc<CompiledProgram>>,
    pc: usize,
    sb: usize,
    sp: usize,
    scope: Option<ScopeRef>,
}

/// Operand stack plus the LIFO stack of saved context frames.
///
/// Owned by one `Runtime` instance; never process-global, so independent
/// runtimes stay isolated and testable in parallel.
#[derive(Debug, Default)]
pub struct Vm {
    /// Operand stack
    pub stack: Vec<JsValue>,
    /// Currently executing program
    pub prg: Option<Rc<CompiledProgram>>,
    /// Program counter within `prg`
    pub pc: usize,
    /// Operand-stack base of the current frame
    pub sb: usize,
    /// Current variable scope
    pub scope: Option<ScopeRef>,
    frames: Vec<ContextFrame>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Save the caller's state and mark a new invocation named `name`.
    ///
    /// The caller then sets up `prg`/`pc`/`sb`/`scope` for the callee. Every
    /// push site must pop exactly once on every exit path before propagating
    /// an error.
    pub fn push_frame(&mut self, name: JsString) {
        self.frames.push(ContextFrame {
            name,
            prg: self.prg.clone(),
            pc: self.pc,
            sb: self.sb,
            sp: self.stack.len(),
            scope: self.scope.clone(),
        });
    }

    /// Restore the caller's state saved by the matching `push_frame`.
    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.prg = frame.prg;
            self.pc = frame.pc;
            self.sb = frame.sb;
            self.scope = frame.scope;
            self.stack.truncate(frame.sp);
        }
    }

    /// Unwind to a recorded depth and operand-stack pointer. Used by the
    /// protected boundary after a fault so no partial frames stay behind.
    pub fn unwind_to(&mut self, depth: usize, sp: usize) {
        while self.frames.len() > depth {
            self.pop_frame();
        }
        if self.stack.len() > sp {
            self.stack.truncate(sp);
        }
    }

    /// Push a value onto the operand stack
    pub fn push(&mut self, value: JsValue) {
        self.stack.push(value);
    }

    /// Pop the top operand, or undefined when the stack is empty
    pub fn pop(&mut self) -> JsValue {
        self.stack.pop().unwrap_or(JsValue::Undefined)
    }

    /// Short stack trace of the active invocations, innermost first.
    pub fn capture_short_stack(&self) -> String {
        let mut lines = Vec::with_capacity(self.frames.len());
        for frame in self.frames.iter().rev() {
            lines.push(format!("    at {}", frame.name));
        }
        lines.join("\n")
    }
}

//! Narrow contract to the compiler/bytecode collaborator.
//!
//! This core does not parse or compile source text. An embedding installs a
//! [`Compiler`] on the runtime; `Runtime::eval` hands it a name, the source
//! and a strictness flag and gets back a [`CompiledProgram`] whose `code`
//! drives the external engine's dispatch loop.
//!
//! Program contract: on entry the operand stack holds, above the frame's
//! stack base, a fresh receiver object and the strictness flag (two
//! bookkeeping values). On normal completion the program must leave its
//! result on top of the stack. Faults are returned as `JsError` and unwound
//! by the caller.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Runtime;
use crate::error::JsError;
use crate::prelude::FxHashMap;
use crate::value::{JsString, JsValue};

/// Executable form of a compiled program, supplied by the external engine.
pub type ProgramCode = Rc<dyn Fn(&mut Runtime) -> Result<(), JsError>>;

/// A compiled program: a display name plus the engine's executable form.
#[derive(Clone)]
pub struct CompiledProgram {
    pub name: JsString,
    pub code: ProgramCode,
}

impl CompiledProgram {
    pub fn new(name: impl Into<JsString>, code: ProgramCode) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }
}

impl std::fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledProgram")
            .field("name", &self.name)
            .finish()
    }
}

/// The compiler collaborator.
pub trait Compiler {
    /// Compile `source` into a program. Parse failures are reported as
    /// `JsError::Parse`; inside `Runtime::eval` they are fatal.
    fn compile(
        &mut self,
        name: &str,
        source: &str,
        strict: bool,
    ) -> Result<Rc<CompiledProgram>, JsError>;
}

/// A lexical variable scope, shared between nested frames when evaluating
/// in the caller's direct scope.
#[derive(Debug, Default)]
pub struct Scope {
    pub bindings: FxHashMap<JsString, JsValue>,
    pub outer: Option<ScopeRef>,
}

pub type ScopeRef = Rc<RefCell<Scope>>;

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outer(outer: Option<ScopeRef>) -> Self {
        Self {
            bindings: FxHashMap::default(),
            outer,
        }
    }

    /// Look up a binding here or in an outer scope
    pub fn lookup(&self, name: &str) -> Option<JsValue> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|o| o.borrow().lookup(name))
    }
}

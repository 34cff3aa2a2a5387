//! Embeddable JavaScript runtime core.
//!
//! Implements the object and property model (prototype chains, descriptors,
//! deterministic enumeration order), a native bridge for exposing host
//! classes, functions and errors to script, and a re-entrant execution
//! context stack with a protected boundary for host-initiated calls.
//!
//! Parsing and bytecode execution are delegated to an external engine
//! through the [`Compiler`] trait; this crate supplies everything such an
//! engine needs to manipulate values and objects, call into host code and
//! report failures.
//!
//! ```
//! use hostjs::{JsValue, Runtime};
//!
//! # fn main() -> Result<(), hostjs::JsError> {
//! let mut rt = Runtime::new();
//! let obj = rt.new_object();
//! rt.set_named(&obj, "answer", JsValue::Number(42.0))?;
//! assert_eq!(rt.get_named(&obj, "answer")?, JsValue::Number(42.0));
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod builtins;
pub mod error;
pub mod object;
pub mod prelude;
pub mod program;
pub mod value;
pub mod vm;

use std::cell::RefCell;
use std::rc::Rc;

pub use bridge::{
    ClassConstructor, ErrorConstructor, ErrorWrapper, GetStacktraceFn, HostError,
    InitStacktraceFn, NativeClass, NativeProperty,
};
pub use error::{Exception, JsError};
pub use object::{define_own_property, delete_property};
pub use program::{CompiledProgram, Compiler, ProgramCode, Scope, ScopeRef};
pub use value::{
    CheapClone, ExoticObject, FunctionCall, HostValue, JsObject, JsObjectRef, JsString, JsSymbol,
    JsValue, NativeCtorFn, NativeFn, NativeFunction, Property, PropertyKey, PropertyKind,
};
pub use vm::Vm;

use value::JsValue as V;

/// Well-known symbols, allocated once per runtime.
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    /// `Symbol.toStringTag`, consulted by `Object.prototype.toString`
    pub to_string_tag: JsSymbol,
}

/// The runtime: owns the execution context stack, the intrinsic prototype
/// objects, the global object and the symbol registry.
///
/// Single-threaded and re-entrant: host code called from script may call
/// back into script on the same runtime, and the context stack keeps the
/// nesting straight.
pub struct Runtime {
    pub vm: Vm,
    compiler: Option<Box<dyn Compiler>>,
    object_prototype: JsObjectRef,
    function_prototype: JsObjectRef,
    error_prototype: JsObjectRef,
    global: JsObjectRef,
    well_known: WellKnownSymbols,
    next_symbol_id: u64,
}

impl Runtime {
    pub fn new() -> Self {
        let object_prototype = Rc::new(RefCell::new(JsObject::new()));
        let function_prototype = Rc::new(RefCell::new(JsObject::with_prototype(
            object_prototype.cheap_clone(),
        )));
        function_prototype.borrow_mut().class = JsString::from("Function");
        let error_prototype = Rc::new(RefCell::new(JsObject::with_prototype(
            object_prototype.cheap_clone(),
        )));
        let global = Rc::new(RefCell::new(JsObject::with_prototype(
            object_prototype.cheap_clone(),
        )));

        let mut rt = Self {
            vm: Vm::new(),
            compiler: None,
            object_prototype,
            function_prototype,
            error_prototype,
            global,
            well_known: WellKnownSymbols {
                to_string_tag: JsSymbol::new(1, Some(String::from("Symbol.toStringTag"))),
            },
            next_symbol_id: 2,
        };
        builtins::init(&mut rt);
        rt
    }

    pub fn object_prototype(&self) -> &JsObjectRef {
        &self.object_prototype
    }

    pub fn function_prototype(&self) -> &JsObjectRef {
        &self.function_prototype
    }

    pub fn error_prototype(&self) -> &JsObjectRef {
        &self.error_prototype
    }

    pub fn global(&self) -> &JsObjectRef {
        &self.global
    }

    pub fn symbols(&self) -> &WellKnownSymbols {
        &self.well_known
    }

    /// Allocate a fresh symbol, unique within this runtime.
    pub fn new_symbol(&mut self, description: Option<String>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description)
    }

    // ---- object creation ----

    /// Create an object with an explicit prototype link (possibly none).
    pub fn new_bare_object(&mut self, prototype: Option<JsObjectRef>) -> JsObjectRef {
        let mut obj = JsObject::new();
        obj.prototype = prototype;
        Rc::new(RefCell::new(obj))
    }

    /// Create an ordinary object inheriting from `Object.prototype`.
    pub fn new_object(&mut self) -> JsObjectRef {
        self.new_bare_object(Some(self.object_prototype.cheap_clone()))
    }

    /// Create an ordinary object with a non-default class tag.
    pub fn new_object_with_class(&mut self, class: &str) -> JsObjectRef {
        let obj = self.new_object();
        obj.borrow_mut().class = JsString::from(class);
        obj
    }

    /// Create an Array exotic object holding `elements`. The `length`
    /// property is writable but neither enumerable nor configurable.
    pub fn new_array(&mut self, elements: Vec<JsValue>) -> JsObjectRef {
        let mut obj = JsObject::with_prototype(self.object_prototype.cheap_clone());
        obj.class = JsString::from("Array");
        let length = elements.len() as u32;
        obj.exotic = ExoticObject::Array { length };
        for (i, element) in elements.into_iter().enumerate() {
            obj.properties
                .insert(PropertyKey::Index(i as u32), Property::data(element));
        }
        obj.properties.insert(
            PropertyKey::from("length"),
            Property::with_attributes(V::Number(length as f64), true, false, false),
        );
        Rc::new(RefCell::new(obj))
    }

    /// Create an Arguments exotic object: enumerable index properties in
    /// argument order plus a non-enumerable `length`.
    pub fn new_arguments(&mut self, args: &[JsValue]) -> JsObjectRef {
        let mut obj = JsObject::with_prototype(self.object_prototype.cheap_clone());
        obj.class = JsString::from("Arguments");
        obj.exotic = ExoticObject::Arguments;
        for (i, arg) in args.iter().enumerate() {
            obj.set_own(PropertyKey::Index(i as u32), arg.clone());
        }
        obj.put_prop("length", V::Number(args.len() as f64));
        Rc::new(RefCell::new(obj))
    }

    // ---- functions ----

    /// Create a native function object.
    pub fn new_native_function(&mut self, name: &str, call: NativeFn, arity: usize) -> JsObjectRef {
        self.new_native_function_in(name, call, arity, None)
    }

    /// Create a native function object, optionally tagged with a display
    /// source location. `name` and `length` are non-writable, non-enumerable
    /// and configurable.
    pub fn new_native_function_in(
        &mut self,
        name: &str,
        call: NativeFn,
        arity: usize,
        file: Option<JsString>,
    ) -> JsObjectRef {
        let name = JsString::from(name);
        let mut obj = JsObject::with_prototype(self.function_prototype.cheap_clone());
        obj.class = JsString::from("Function");
        obj.properties.insert(
            PropertyKey::from("name"),
            Property::with_attributes(V::from(name.cheap_clone()), false, false, true),
        );
        obj.properties.insert(
            PropertyKey::from("length"),
            Property::with_attributes(V::Number(arity as f64), false, false, true),
        );
        obj.exotic = ExoticObject::Function(NativeFunction {
            name,
            func: call,
            arity,
            construct: None,
            file,
        });
        Rc::new(RefCell::new(obj))
    }

    /// Create a constructor function: callable only with `new`, carrying a
    /// non-writable, non-enumerable, non-configurable `prototype` property
    /// and a `constructor` backlink on the prototype.
    pub fn new_constructor(
        &mut self,
        name: JsString,
        construct: NativeCtorFn,
        proto: JsObjectRef,
        arity: usize,
    ) -> JsObjectRef {
        let call_name = name.cheap_clone();
        let call: NativeFn = Rc::new(move |_rt, _call| {
            Err(JsError::type_error(format!(
                "Constructor {} requires 'new'",
                call_name
            )))
        });
        let function = self.new_native_function_in(name.as_str(), call, arity, None);
        {
            let mut f = function.borrow_mut();
            if let ExoticObject::Function(native) = &mut f.exotic {
                native.construct = Some(construct);
            }
            f.properties.insert(
                PropertyKey::from("prototype"),
                Property::with_attributes(V::Object(proto.cheap_clone()), false, false, false),
            );
        }
        proto
            .borrow_mut()
            .put_prop("constructor", V::Object(function.cheap_clone()));
        function
    }

    /// Install a native method on `target` with the bridge's default
    /// attributes (writable, non-enumerable, configurable).
    pub fn register_method(
        &mut self,
        target: &JsObjectRef,
        name: &str,
        method: fn(&mut Runtime, FunctionCall) -> Result<JsValue, JsError>,
        arity: usize,
    ) {
        let func = self.new_native_function(name, Rc::new(method), arity);
        target.borrow_mut().put_prop(name, V::Object(func));
    }

    // ---- invocation ----

    /// Call a value as a function.
    pub fn call(
        &mut self,
        func: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        match func.as_object() {
            Some(obj) if obj.borrow().is_callable() => {
                let obj = obj.cheap_clone();
                self.call_function_object(&obj, this, args)
            }
            _ => Err(JsError::type_error(format!(
                "{} is not a function",
                func.to_js_string()
            ))),
        }
    }

    /// Call a function object directly. Pushes a context frame named after
    /// the function and pops it on every exit path.
    pub fn call_function_object(
        &mut self,
        func: &JsObjectRef,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let (name, callable) = {
            let borrowed = func.borrow();
            let Some(native) = borrowed.as_function() else {
                return Err(JsError::type_error("not a function"));
            };
            (native.name.cheap_clone(), native.func.cheap_clone())
        };
        self.vm.push_frame(name);
        let result = callable(self, FunctionCall::new(this, args.to_vec()));
        self.vm.pop_frame();
        result
    }

    /// Construct an instance: create an object whose prototype is the
    /// constructor's `prototype` property, then run the constructor body on
    /// it inside its own context frame.
    pub fn construct(&mut self, ctor: &JsObjectRef, args: &[JsValue]) -> Result<JsValue, JsError> {
        let (name, construct) = {
            let borrowed = ctor.borrow();
            let Some(native) = borrowed.as_function() else {
                return Err(JsError::type_error("not a constructor"));
            };
            let Some(construct) = &native.construct else {
                return Err(JsError::type_error(format!(
                    "{} is not a constructor",
                    native.name
                )));
            };
            (native.name.cheap_clone(), construct.cheap_clone())
        };

        let proto = match ctor
            .borrow()
            .get_own_property(&PropertyKey::from("prototype"))
            .map(Property::value)
        {
            Some(V::Object(p)) => p,
            _ => self.object_prototype.cheap_clone(),
        };
        let instance = self.new_bare_object(Some(proto));

        self.vm.push_frame(name);
        let result = construct(self, args, &instance);
        self.vm.pop_frame();
        result?;
        Ok(V::Object(instance))
    }

    // ---- program evaluation ----

    /// Install the compiler collaborator used by [`eval`](Self::eval).
    pub fn set_compiler(&mut self, compiler: Box<dyn Compiler>) {
        self.compiler = Some(compiler);
    }

    /// Compile source text through the installed collaborator. Unlike
    /// [`eval`](Self::eval), compile failures are recoverable here.
    pub fn compile(
        &mut self,
        name: &str,
        source: &str,
        strict: bool,
    ) -> Result<Rc<CompiledProgram>, JsError> {
        let Some(compiler) = self.compiler.as_mut() else {
            return Err(JsError::invalid_argument("no compiler installed"));
        };
        compiler.compile(name, source, strict)
    }

    /// Compile and run source text in a fresh context frame.
    ///
    /// With `direct` set, the program sees the caller's current scope;
    /// otherwise it runs with a clean scope. Compile failures are a breach of
    /// the collaborator contract at this point and abort the process; use
    /// [`compile`](Self::compile) first when the source is untrusted.
    /// Runtime faults come back as errors with the context stack already
    /// restored to its pre-eval state.
    pub fn eval(
        &mut self,
        name: &str,
        source: &str,
        direct: bool,
        strict: bool,
    ) -> Result<JsValue, JsError> {
        let program = match self.compile(name, source, strict) {
            Ok(program) => program,
            Err(err) => panic!("eval: {}", err),
        };

        self.vm.push_frame(program.name.cheap_clone());
        self.vm.prg = Some(program.cheap_clone());
        self.vm.pc = 0;
        if !direct {
            self.vm.scope = None;
        }
        self.vm.sb = self.vm.stack.len();

        // Program contract: receiver object and strictness flag sit above sb.
        let receiver = self.new_object();
        self.vm.push(V::Object(receiver));
        self.vm.push(V::Boolean(strict));

        let code = program.code.clone();
        match code(self) {
            Ok(()) => {
                let value = self.vm.pop();
                self.vm.pop_frame();
                Ok(value)
            }
            Err(err) => {
                self.vm.pop_frame();
                Err(err)
            }
        }
    }

    /// Run host-initiated work inside the protected boundary: a fault is
    /// returned instead of propagating, and the context stack is unwound to
    /// its depth at entry so no partial frames survive.
    pub fn protect<F>(&mut self, f: F) -> (JsValue, Option<JsError>)
    where
        F: FnOnce(&mut Runtime) -> Result<JsValue, JsError>,
    {
        let depth = self.vm.depth();
        let sp = self.vm.stack.len();
        match f(self) {
            Ok(value) => (value, None),
            Err(err) => {
                self.vm.unwind_to(depth, sp);
                (V::Undefined, Some(err))
            }
        }
    }

    /// Wrap a script value as a thrown error, attaching the current short
    /// stack trace when one exists.
    pub fn throw(&self, value: JsValue) -> JsError {
        let stack = self.vm.capture_short_stack();
        if stack.is_empty() {
            JsError::thrown(value)
        } else {
            JsError::Thrown(Exception::with_stack(value, stack))
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

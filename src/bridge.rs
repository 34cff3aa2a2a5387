//! Native bridge
//!
//! Lets host code expose classes, plain functions and errors to script
//! without hand-writing property tables, and converts host data into script
//! values. Bridge-installed properties are writable, non-enumerable and
//! configurable; the `customerror` marker is a plain enumerable property.

use std::rc::Rc;

use serde::Serialize;

use crate::Runtime;
use crate::error::JsError;
use crate::value::{
    CheapClone, FunctionCall, HostValue, JsObjectRef, JsString, JsValue, NativeCtorFn, NativeFn,
};

/// A host error shared between script wrappers and host callbacks.
pub type HostError = Rc<dyn std::error::Error>;

/// Constructor callable of a native class: returns the host value to wrap.
pub type ClassConstructor = Rc<dyn Fn(&mut Runtime, FunctionCall) -> Result<HostValue, JsError>>;

/// Constructor callable of a native error class: always produces a host error.
pub type ErrorConstructor = Rc<dyn Fn(&mut Runtime, FunctionCall) -> HostError>;

/// Receives the short stack trace captured when a native error is constructed.
pub type InitStacktraceFn = Rc<dyn Fn(&HostError, &str)>;

/// Reports the host-side stack trace of an error; an empty string means the
/// error is a plain custom error with no native trace.
pub type GetStacktraceFn = Rc<dyn Fn(&HostError) -> String>;

/// A named value installed by the bridge.
#[derive(Clone)]
pub struct NativeProperty {
    pub name: JsString,
    pub value: JsValue,
}

impl NativeProperty {
    pub fn new(name: impl Into<JsString>, value: impl Into<JsValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A script-visible class backed by host code.
///
/// Owns its prototype object; the constructor function holds the prototype
/// through its own non-configurable `prototype` property.
#[derive(Clone)]
pub struct NativeClass {
    pub class_name: JsString,
    pub class_proto: JsObjectRef,
    /// The constructor function object
    pub function: JsObjectRef,
    func_props: Rc<Vec<NativeProperty>>,
    get_stacktrace: Option<GetStacktraceFn>,
}

impl NativeClass {
    /// Produce a fresh instance of this class wrapping `value`.
    ///
    /// When the host value is an error, `message` is installed and, if a
    /// configured `get_stacktrace` reports no native trace, the instance is
    /// marked as a plain custom error.
    pub fn instance_of(&self, rt: &mut Runtime, value: HostValue) -> JsValue {
        let obj = rt.new_bare_object(Some(self.class_proto.cheap_clone()));
        {
            let mut borrowed = obj.borrow_mut();
            borrowed.class = self.class_name.cheap_clone();
            borrowed.wrapped = Some(value.clone());
        }
        if let HostValue::Error(err) = &value {
            if let Some(get_stacktrace) = &self.get_stacktrace {
                if get_stacktrace(err).is_empty() {
                    obj.borrow_mut().set_own("customerror", true);
                }
            }
            obj.borrow_mut().put_prop("message", err.to_string());
        }
        {
            let mut borrowed = obj.borrow_mut();
            borrowed.put_prop("name", self.class_name.cheap_clone());
            for prop in self.func_props.iter() {
                borrowed.put_prop(prop.name.cheap_clone(), prop.value.clone());
            }
        }
        JsValue::Object(obj)
    }
}

/// Turns host errors into custom-error objects of a registered error name.
#[derive(Clone)]
pub struct ErrorWrapper {
    name: JsString,
}

impl ErrorWrapper {
    pub fn wrap(&self, rt: &mut Runtime, err: &dyn std::error::Error) -> JsValue {
        JsValue::Object(rt.make_custom_error(self.name.as_str(), &err.to_string()))
    }
}

impl Runtime {
    /// Build a script-visible class: a prototype object (an ordinary
    /// instance of the base Object class, so `instanceof` works) carrying
    /// `class_props`, and a constructor that wraps the host value returned
    /// by `ctor` and installs `func_props` then `class_props` on each new
    /// instance. Class properties are installed last and win on collision.
    pub fn create_native_class(
        &mut self,
        class_name: &str,
        ctor: ClassConstructor,
        class_props: Vec<NativeProperty>,
        func_props: Vec<NativeProperty>,
    ) -> NativeClass {
        let name = JsString::from(class_name);
        let class_proto = self.new_bare_object(Some(self.object_prototype().cheap_clone()));
        {
            let mut proto = class_proto.borrow_mut();
            proto.class = name.cheap_clone();
            proto.put_prop("name", name.cheap_clone());
            for prop in &class_props {
                proto.put_prop(prop.name.cheap_clone(), prop.value.clone());
            }
        }

        let class_props = Rc::new(class_props);
        let func_props = Rc::new(func_props);
        let construct: NativeCtorFn = {
            let name = name.cheap_clone();
            let class_props = class_props.cheap_clone();
            let func_props = func_props.cheap_clone();
            Rc::new(move |rt, args, this| {
                this.borrow_mut().class = name.cheap_clone();
                let call = FunctionCall::new(JsValue::Object(this.cheap_clone()), args.to_vec());
                let host = ctor(rt, call)?;
                let mut instance = this.borrow_mut();
                instance.wrapped = Some(host);
                instance.put_prop("name", name.cheap_clone());
                for prop in func_props.iter() {
                    instance.put_prop(prop.name.cheap_clone(), prop.value.clone());
                }
                for prop in class_props.iter() {
                    instance.put_prop(prop.name.cheap_clone(), prop.value.clone());
                }
                Ok(())
            })
        };

        let function = self.new_constructor(name.cheap_clone(), construct, class_proto.cheap_clone(), 1);
        {
            let mut f = function.borrow_mut();
            f.put_prop("name", name.cheap_clone());
            for prop in func_props.iter() {
                f.put_prop(prop.name.cheap_clone(), prop.value.clone());
            }
        }

        NativeClass {
            class_name: name,
            class_proto,
            function,
            func_props,
            get_stacktrace: None,
        }
    }

    /// Like [`create_native_class`](Self::create_native_class), but the
    /// produced constructor always wraps the host error returned by `ctor`:
    /// `message` is the error's display form, `init_stacktrace` receives a
    /// short stack trace captured at construction time, and the instance is
    /// tagged with the `customerror` marker.
    pub fn create_native_error_class(
        &mut self,
        class_name: &str,
        ctor: ErrorConstructor,
        init_stacktrace: InitStacktraceFn,
        get_stacktrace: GetStacktraceFn,
        class_props: Vec<NativeProperty>,
        func_props: Vec<NativeProperty>,
    ) -> NativeClass {
        let name = JsString::from(class_name);
        let class_proto = self.new_bare_object(Some(self.error_prototype().cheap_clone()));
        {
            let mut proto = class_proto.borrow_mut();
            proto.class = JsString::from("Error");
            proto.put_prop("name", name.cheap_clone());
            for prop in &class_props {
                proto.put_prop(prop.name.cheap_clone(), prop.value.clone());
            }
        }

        let func_props = Rc::new(func_props);
        let construct: NativeCtorFn = {
            Rc::new(move |rt, args, this| {
                this.borrow_mut().class = JsString::from("Error");
                let call = FunctionCall::new(JsValue::Object(this.cheap_clone()), args.to_vec());
                let err = ctor(rt, call);
                let stack = rt.vm.capture_short_stack();
                init_stacktrace(&err, &stack);
                let mut instance = this.borrow_mut();
                instance.put_prop("message", err.to_string());
                instance.set_own("customerror", true);
                instance.wrapped = Some(HostValue::Error(err));
                Ok(())
            })
        };

        let function = self.new_constructor(name.cheap_clone(), construct, class_proto.cheap_clone(), 1);
        {
            let mut f = function.borrow_mut();
            for prop in func_props.iter() {
                f.put_prop(prop.name.cheap_clone(), prop.value.clone());
            }
        }

        NativeClass {
            class_name: name,
            class_proto,
            function,
            func_props,
            get_stacktrace: Some(get_stacktrace),
        }
    }

    /// Register a named error kind: returns the constructor value and a
    /// wrapper that turns host errors into custom-error objects of that name.
    pub fn create_native_error(&mut self, name: &str) -> (JsValue, ErrorWrapper) {
        let class_name = JsString::from(name);
        let proto = self.new_bare_object(Some(self.error_prototype().cheap_clone()));
        {
            let mut borrowed = proto.borrow_mut();
            borrowed.class = JsString::from("Error");
            borrowed.put_prop("name", class_name.cheap_clone());
        }

        let construct: NativeCtorFn = Rc::new(move |_rt, args, this| {
            let mut instance = this.borrow_mut();
            instance.class = JsString::from("Error");
            if let Some(message) = args.first() {
                if !message.is_null_or_undefined() {
                    instance.put_prop("message", message.to_js_string());
                }
            }
            Ok(())
        });
        let function = self.new_constructor(class_name.cheap_clone(), construct, proto, 1);

        (
            JsValue::Object(function),
            ErrorWrapper { name: class_name },
        )
    }

    /// Create a native function with a display name and source location.
    /// Fails with an invalid-argument error when the callable is absent.
    pub fn create_native_function(
        &mut self,
        name: &str,
        file: Option<&str>,
        call: Option<NativeFn>,
    ) -> Result<JsValue, JsError> {
        let Some(call) = call else {
            return Err(JsError::invalid_argument("call cannot be nil"));
        };
        let func = self.new_native_function_in(name, call, 1, file.map(JsString::from));
        Ok(JsValue::Object(func))
    }

    /// Synthesize a one-off Error instance with a given name and the
    /// `customerror` marker, without a backing class.
    pub fn make_custom_error(&mut self, name: &str, message: &str) -> JsObjectRef {
        let obj = self.new_bare_object(Some(self.error_prototype().cheap_clone()));
        let mut borrowed = obj.borrow_mut();
        borrowed.class = JsString::from("Error");
        borrowed.put_prop("message", message);
        borrowed.set_own("name", name);
        borrowed.set_own("customerror", true);
        drop(borrowed);
        obj
    }

    /// Convert any serializable host value into a script value inside the
    /// protected boundary: a fault raised during conversion is returned as
    /// an error instead of crashing the embedding, and the context stack is
    /// restored to its pre-call depth.
    pub fn try_to_value<T: Serialize>(&mut self, value: &T) -> (JsValue, Option<JsError>) {
        self.protect(|rt| rt.to_value(value))
    }

    /// Convert a serializable host value into a script value.
    pub fn to_value<T: Serialize>(&mut self, value: &T) -> Result<JsValue, JsError> {
        let json = serde_json::to_value(value)
            .map_err(|e| JsError::invalid_argument(format!("cannot convert host value: {}", e)))?;
        Ok(self.json_to_value(&json))
    }

    /// Convert a JSON value: scalars to primitives, arrays to Array exotic
    /// objects, maps to ordinary objects in key order.
    pub fn json_to_value(&mut self, json: &serde_json::Value) -> JsValue {
        match json {
            serde_json::Value::Null => JsValue::Null,
            serde_json::Value::Bool(b) => JsValue::Boolean(*b),
            serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => JsValue::from(s.as_str()),
            serde_json::Value::Array(items) => {
                let elements: Vec<JsValue> =
                    items.iter().map(|item| self.json_to_value(item)).collect();
                JsValue::Object(self.new_array(elements))
            }
            serde_json::Value::Object(map) => {
                let obj = self.new_object();
                for (key, item) in map {
                    let value = self.json_to_value(item);
                    obj.borrow_mut().set_own(key.as_str(), value);
                }
                JsValue::Object(obj)
            }
        }
    }
}

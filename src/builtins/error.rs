//! Error built-in
//!
//! The base `Error` prototype and constructor that native error classes and
//! custom errors hang off.

use std::rc::Rc;

use crate::Runtime;
use crate::error::JsError;
use crate::value::{CheapClone, FunctionCall, JsObjectRef, JsString, JsValue, NativeCtorFn};

pub fn init_error_prototype(rt: &mut Runtime) {
    let proto = rt.error_prototype().cheap_clone();
    {
        let mut borrowed = proto.borrow_mut();
        borrowed.class = JsString::from("Error");
        borrowed.put_prop("name", "Error");
        borrowed.put_prop("message", "");
    }
    rt.register_method(&proto, "toString", error_to_string, 0);
}

pub fn create_error_constructor(rt: &mut Runtime) -> JsObjectRef {
    let construct: NativeCtorFn = Rc::new(|_rt, args, this| {
        let mut instance = this.borrow_mut();
        instance.class = JsString::from("Error");
        if let Some(message) = args.first() {
            if !message.is_null_or_undefined() {
                instance.put_prop("message", message.to_js_string());
            }
        }
        Ok(())
    });
    let proto = rt.error_prototype().cheap_clone();
    rt.new_constructor(JsString::from("Error"), construct, proto, 1)
}

/// `Error.prototype.toString`: "name" or "name: message".
pub fn error_to_string(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let Some(obj) = call.this.as_object().map(CheapClone::cheap_clone) else {
        return Err(JsError::type_error(
            "Error.prototype.toString called on non-object",
        ));
    };

    let name = match rt.get_named(&obj, "name")? {
        JsValue::Undefined => JsString::from("Error"),
        other => other.to_js_string(),
    };
    let message = match rt.get_named(&obj, "message")? {
        JsValue::Undefined => JsString::from(""),
        other => other.to_js_string(),
    };

    if message.is_empty() {
        Ok(JsValue::from(name))
    } else if name.is_empty() {
        Ok(JsValue::from(message))
    } else {
        Ok(JsValue::from(format!("{}: {}", name, message)))
    }
}

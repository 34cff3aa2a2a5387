//! Built-in objects installed on the global object at runtime creation.

pub mod error;
pub mod object;

use crate::Runtime;
use crate::value::JsValue;

/// Install the built-ins this core reproduces: the `Object` constructor and
/// prototype surface, and the `Error` machinery backing the native bridge.
pub fn init(rt: &mut Runtime) {
    object::init_object_prototype(rt);
    let object_ctor = object::create_object_constructor(rt);

    error::init_error_prototype(rt);
    let error_ctor = error::create_error_constructor(rt);

    let global = rt.global().clone();
    let mut g = global.borrow_mut();
    g.put_prop("Object", JsValue::Object(object_ctor));
    g.put_prop("Error", JsValue::Object(error_ctor));
    g.put_prop("globalThis", JsValue::Object(global.clone()));
}

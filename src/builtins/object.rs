//! Object built-in methods
//!
//! The script-visible surface reproduced by the object model: the `Object`
//! constructor statics, `Object.prototype` methods, and `[object X]` tag
//! resolution.

use std::rc::Rc;

use crate::Runtime;
use crate::error::JsError;
use crate::object::define_own_property;
use crate::value::{
    CheapClone, FunctionCall, JsObjectRef, JsString, JsValue, NativeCtorFn, Property, PropertyKey,
    PropertyKind,
};

/// Initialize Object.prototype with toString, hasOwnProperty and
/// __defineSetter__. The prototype object must already exist on the runtime.
pub fn init_object_prototype(rt: &mut Runtime) {
    let proto = rt.object_prototype().cheap_clone();

    rt.register_method(&proto, "hasOwnProperty", object_has_own_property, 1);
    rt.register_method(&proto, "toString", object_to_string, 0);
    rt.register_method(&proto, "__defineSetter__", object_define_setter, 2);
}

/// Create the Object constructor with its static methods.
pub fn create_object_constructor(rt: &mut Runtime) -> JsObjectRef {
    let construct: NativeCtorFn = Rc::new(|_rt, _args, _this| Ok(()));
    let proto = rt.object_prototype().cheap_clone();
    let constructor = rt.new_constructor(JsString::from("Object"), construct, proto, 1);

    rt.register_method(&constructor, "keys", object_keys, 1);
    rt.register_method(&constructor, "values", object_values, 1);
    rt.register_method(&constructor, "entries", object_entries, 1);
    rt.register_method(&constructor, "fromEntries", object_from_entries, 1);
    rt.register_method(&constructor, "create", object_create, 2);
    rt.register_method(
        &constructor,
        "getOwnPropertyDescriptor",
        object_get_own_property_descriptor,
        2,
    );

    constructor
}

fn required_object<'a>(value: &'a JsValue, who: &str) -> Result<&'a JsObjectRef, JsError> {
    value
        .as_object()
        .ok_or_else(|| JsError::type_error(format!("{} called on non-object", who)))
}

pub fn object_keys(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let arg = call.argument(0);
    let obj = required_object(&arg, "Object.keys")?;
    let keys: Vec<JsValue> = obj
        .borrow()
        .own_enumerable_string_keys()
        .iter()
        .map(|key| JsValue::from(key.to_string()))
        .collect();
    Ok(JsValue::Object(rt.new_array(keys)))
}

pub fn object_values(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let arg = call.argument(0);
    let obj = required_object(&arg, "Object.values")?.cheap_clone();
    let keys = obj.borrow().own_enumerable_string_keys();
    let mut values = Vec::with_capacity(keys.len());
    for key in &keys {
        values.push(rt.get(&obj, key, &arg)?);
    }
    Ok(JsValue::Object(rt.new_array(values)))
}

pub fn object_entries(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let arg = call.argument(0);
    let obj = required_object(&arg, "Object.entries")?.cheap_clone();
    let keys = obj.borrow().own_enumerable_string_keys();
    let mut entries = Vec::with_capacity(keys.len());
    for key in &keys {
        let value = rt.get(&obj, key, &arg)?;
        let pair = rt.new_array(vec![JsValue::from(key.to_string()), value]);
        entries.push(JsValue::Object(pair));
    }
    Ok(JsValue::Object(rt.new_array(entries)))
}

pub fn object_from_entries(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let arg = call.argument(0);
    let Some(iterable) = arg.as_object().map(CheapClone::cheap_clone) else {
        return Err(JsError::type_error("Object.fromEntries requires an iterable"));
    };

    let length = match iterable.borrow().array_length() {
        Some(len) => len,
        None => {
            return Err(JsError::type_error(
                "Object.fromEntries requires an array-like",
            ));
        }
    };

    let result = rt.new_object();
    for i in 0..length {
        let entry = rt.get(&iterable, &PropertyKey::Index(i), &arg)?;
        let Some(entry) = entry.as_object().map(CheapClone::cheap_clone) else {
            continue;
        };
        let entry_value = JsValue::Object(entry.cheap_clone());
        let key = rt.get(&entry, &PropertyKey::Index(0), &entry_value)?;
        let value = rt.get(&entry, &PropertyKey::Index(1), &entry_value)?;
        // Later pairs overwrite earlier ones with the same key.
        define_own_property(
            &result,
            PropertyKey::from(key.to_js_string()),
            Property::data(value),
        )?;
    }
    Ok(JsValue::Object(result))
}

pub fn object_create(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let proto = match call.argument(0) {
        JsValue::Object(obj) => Some(obj),
        JsValue::Null => None,
        _ => {
            return Err(JsError::type_error(
                "Object prototype may only be an Object or null",
            ));
        }
    };

    let obj = rt.new_bare_object(proto);

    let descriptors = call.argument(1);
    if let Some(desc_map) = descriptors.as_object().map(CheapClone::cheap_clone) {
        let keys = desc_map.borrow().own_enumerable_string_keys();
        for key in keys {
            let desc_value = rt.get(&desc_map, &key, &descriptors)?;
            let Some(desc_obj) = desc_value.as_object().map(CheapClone::cheap_clone) else {
                return Err(JsError::type_error("Property description must be an object"));
            };
            let prop = to_property_descriptor(rt, &desc_obj)?;
            define_own_property(&obj, key, prop)?;
        }
    }

    Ok(JsValue::Object(obj))
}

/// Parse a script-side descriptor object ({value, writable, enumerable,
/// configurable, get, set}) into a Property. Flag defaults are false.
fn to_property_descriptor(rt: &mut Runtime, desc: &JsObjectRef) -> Result<Property, JsError> {
    let desc_value = JsValue::Object(desc.cheap_clone());
    let enumerable = rt
        .get(desc, &PropertyKey::from("enumerable"), &desc_value)?
        .to_boolean();
    let configurable = rt
        .get(desc, &PropertyKey::from("configurable"), &desc_value)?
        .to_boolean();

    let has_getter = rt.has_property(desc, &PropertyKey::from("get"));
    let has_setter = rt.has_property(desc, &PropertyKey::from("set"));
    if has_getter || has_setter {
        let getter = accessor_slot(rt, desc, &desc_value, "get")?;
        let setter = accessor_slot(rt, desc, &desc_value, "set")?;
        let mut prop = Property::accessor(getter, setter);
        prop.enumerable = enumerable;
        prop.configurable = configurable;
        return Ok(prop);
    }

    let value = rt.get(desc, &PropertyKey::from("value"), &desc_value)?;
    let writable = rt
        .get(desc, &PropertyKey::from("writable"), &desc_value)?
        .to_boolean();
    Ok(Property::with_attributes(
        value,
        writable,
        enumerable,
        configurable,
    ))
}

fn accessor_slot(
    rt: &mut Runtime,
    desc: &JsObjectRef,
    desc_value: &JsValue,
    slot: &str,
) -> Result<Option<JsObjectRef>, JsError> {
    match rt.get(desc, &PropertyKey::from(slot), desc_value)? {
        JsValue::Undefined => Ok(None),
        JsValue::Object(f) if f.borrow().is_callable() => Ok(Some(f)),
        _ => Err(JsError::type_error(format!(
            "Property descriptor {} must be a function",
            slot
        ))),
    }
}

pub fn object_get_own_property_descriptor(
    rt: &mut Runtime,
    call: FunctionCall,
) -> Result<JsValue, JsError> {
    let arg = call.argument(0);
    let obj = required_object(&arg, "Object.getOwnPropertyDescriptor")?;
    let key = PropertyKey::from_value(&call.argument(1));

    let prop = match obj.borrow().get_own_property(&key) {
        Some(prop) => prop.clone(),
        None => return Ok(JsValue::Undefined),
    };

    let result = rt.new_object();
    {
        let mut borrowed = result.borrow_mut();
        match &prop.kind {
            PropertyKind::Data { value, writable } => {
                borrowed.set_own("value", value.clone());
                borrowed.set_own("writable", *writable);
            }
            PropertyKind::Accessor { getter, setter } => {
                borrowed.set_own(
                    "get",
                    getter
                        .as_ref()
                        .map(|g| JsValue::Object(g.cheap_clone()))
                        .unwrap_or(JsValue::Undefined),
                );
                borrowed.set_own(
                    "set",
                    setter
                        .as_ref()
                        .map(|s| JsValue::Object(s.cheap_clone()))
                        .unwrap_or(JsValue::Undefined),
                );
            }
        }
        borrowed.set_own("enumerable", prop.enumerable);
        borrowed.set_own("configurable", prop.configurable);
    }
    Ok(JsValue::Object(result))
}

pub fn object_has_own_property(_rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let Some(obj) = call.this.as_object() else {
        return Ok(JsValue::Boolean(false));
    };
    let key = PropertyKey::from_value(&call.argument(0));
    Ok(JsValue::Boolean(obj.borrow().has_own_property(&key)))
}

pub fn object_to_string(rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let tag = rt.object_to_string_tag(&call.this)?;
    Ok(JsValue::from(format!("[object {}]", tag)))
}

/// `Object.prototype.__defineSetter__(key, fn)`: installs an enumerable,
/// configurable accessor, preserving any existing getter.
pub fn object_define_setter(_rt: &mut Runtime, call: FunctionCall) -> Result<JsValue, JsError> {
    let Some(obj) = call.this.as_object() else {
        return Err(JsError::type_error(
            "Object.prototype.__defineSetter__ called on non-object",
        ));
    };

    let setter = match call.argument(1) {
        JsValue::Object(f) if f.borrow().is_callable() => f,
        _ => {
            return Err(JsError::type_error(
                "Object.prototype.__defineSetter__: Expecting function",
            ));
        }
    };

    let key = PropertyKey::from_value(&call.argument(0));
    let existing_getter = obj.borrow().get_own_property(&key).and_then(|prop| {
        match &prop.kind {
            PropertyKind::Accessor { getter, .. } => getter.as_ref().map(CheapClone::cheap_clone),
            PropertyKind::Data { .. } => None,
        }
    });

    define_own_property(obj, key, Property::accessor(existing_getter, Some(setter)))?;
    Ok(JsValue::Undefined)
}

impl Runtime {
    /// Resolve the tag used by `Object.prototype.toString`: undefined and
    /// null have fixed tags, a string-valued `Symbol.toStringTag` property
    /// (own or inherited) wins, and the internal class tag is the fallback.
    pub fn object_to_string_tag(&mut self, value: &JsValue) -> Result<JsString, JsError> {
        let tag = match value {
            JsValue::Undefined => JsString::from("Undefined"),
            JsValue::Null => JsString::from("Null"),
            JsValue::Boolean(_) => JsString::from("Boolean"),
            JsValue::Number(_) => JsString::from("Number"),
            JsValue::String(_) => JsString::from("String"),
            JsValue::Symbol(_) => JsString::from("Symbol"),
            JsValue::Object(obj) => {
                let key = PropertyKey::Symbol(self.symbols().to_string_tag.clone());
                match self.get(obj, &key, value)? {
                    JsValue::String(tag) => tag,
                    _ => obj.borrow().class.cheap_clone(),
                }
            }
        };
        Ok(tag)
    }
}

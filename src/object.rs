//! Object / property model operations
//!
//! Descriptor definition with compatibility checks, prototype-chain `get`
//! and `set` with an explicit receiver, and deletion. The enumeration-order
//! rule lives with the property table in [`crate::value::JsObject`].

use crate::Runtime;
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsObjectRef, JsValue, Property, PropertyKey, PropertyKind,
};

/// Define or redefine an own property.
///
/// Fails with a TypeError when the object is not extensible and the key is
/// new, or when an existing non-configurable descriptor would be redefined
/// incompatibly (configurable false→true, writable false→true, data↔accessor
/// flip). Validation happens before any mutation, so a failed call leaves
/// the table untouched. Updates keep the property's table position; inserts
/// append.
pub fn define_own_property(
    obj: &JsObjectRef,
    key: PropertyKey,
    prop: Property,
) -> Result<(), JsError> {
    let mut borrowed = obj.borrow_mut();
    match borrowed.properties.get(&key) {
        None => {
            if !borrowed.extensible {
                return Err(JsError::type_error(format!(
                    "Cannot add property {}, object is not extensible",
                    key
                )));
            }
        }
        Some(existing) => {
            if !existing.configurable {
                if prop.configurable {
                    return Err(JsError::cannot_redefine(&key));
                }
                match (&existing.kind, &prop.kind) {
                    (PropertyKind::Data { writable: old, .. }, PropertyKind::Data { writable: new, .. }) => {
                        if !*old && *new {
                            return Err(JsError::cannot_redefine(&key));
                        }
                    }
                    // data <-> accessor flips are never compatible here
                    _ => return Err(JsError::cannot_redefine(&key)),
                }
            }
        }
    }
    note_index_key(&mut borrowed, &key);
    borrowed.properties.insert(key, prop);
    Ok(())
}

/// Delete an own property. Non-configurable properties refuse deletion.
pub fn delete_property(obj: &JsObjectRef, key: &PropertyKey) -> bool {
    let mut borrowed = obj.borrow_mut();
    match borrowed.properties.get(key) {
        Some(prop) if !prop.configurable => false,
        Some(_) => {
            borrowed.properties.shift_remove(key);
            true
        }
        None => true,
    }
}

/// Keep the array length in step with index-key inserts.
fn note_index_key(obj: &mut crate::value::JsObject, key: &PropertyKey) {
    if let (ExoticObject::Array { length }, PropertyKey::Index(i)) = (&mut obj.exotic, key) {
        if *i >= *length {
            let new_len = *i + 1;
            *length = new_len;
            if let Some(prop) = obj.properties.get_mut(&PropertyKey::from("length")) {
                if let PropertyKind::Data { value, .. } = &mut prop.kind {
                    *value = JsValue::Number(new_len as f64);
                }
            }
        }
    }
}

/// What a chain walk found for a key.
enum Found {
    Data { value: JsValue, writable: bool },
    Accessor {
        getter: Option<JsObjectRef>,
        setter: Option<JsObjectRef>,
    },
}

fn find_own(obj: &JsObjectRef, key: &PropertyKey) -> Option<Found> {
    let borrowed = obj.borrow();
    borrowed.properties.get(key).map(|prop| match &prop.kind {
        PropertyKind::Data { value, writable } => Found::Data {
            value: value.clone(),
            writable: *writable,
        },
        PropertyKind::Accessor { getter, setter } => Found::Accessor {
            getter: getter.as_ref().map(CheapClone::cheap_clone),
            setter: setter.as_ref().map(CheapClone::cheap_clone),
        },
    })
}

fn proto_of(obj: &JsObjectRef) -> Option<JsObjectRef> {
    obj.borrow().prototype.as_ref().map(CheapClone::cheap_clone)
}

impl Runtime {
    /// Read `key` from `obj`, walking the prototype chain. Accessor getters
    /// run with `receiver` as the call target; a getter-less accessor and an
    /// absent key both produce undefined.
    pub fn get(
        &mut self,
        obj: &JsObjectRef,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> Result<JsValue, JsError> {
        let mut cursor = Some(obj.cheap_clone());
        while let Some(current) = cursor {
            match find_own(&current, key) {
                Some(Found::Data { value, .. }) => return Ok(value),
                Some(Found::Accessor { getter: Some(g), .. }) => {
                    return self.call_function_object(&g, receiver.clone(), &[]);
                }
                Some(Found::Accessor { getter: None, .. }) => return Ok(JsValue::Undefined),
                None => cursor = proto_of(&current),
            }
        }
        Ok(JsValue::Undefined)
    }

    /// Convenience: read a named property with the object itself as receiver.
    pub fn get_named(&mut self, obj: &JsObjectRef, name: &str) -> Result<JsValue, JsError> {
        let receiver = JsValue::Object(obj.cheap_clone());
        self.get(obj, &PropertyKey::from(name), &receiver)
    }

    /// Write `key` on `obj` with `receiver` as the write target. An accessor
    /// found anywhere on the chain routes through its setter (a setter-less
    /// accessor vetoes); a non-writable data property vetoes; otherwise an
    /// own enumerable/writable/configurable data property is defined or
    /// updated on `receiver`. Vetoes are silent, as in non-strict code.
    pub fn set(
        &mut self,
        obj: &JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> Result<(), JsError> {
        let mut cursor = Some(obj.cheap_clone());
        while let Some(current) = cursor {
            match find_own(&current, key) {
                Some(Found::Accessor { setter: Some(s), .. }) => {
                    self.call_function_object(&s, receiver.clone(), &[value])?;
                    return Ok(());
                }
                Some(Found::Accessor { setter: None, .. }) => return Ok(()),
                Some(Found::Data { writable: false, .. }) => return Ok(()),
                Some(Found::Data { writable: true, .. }) => break,
                None => cursor = proto_of(&current),
            }
        }

        let Some(target) = receiver.as_object() else {
            return Ok(());
        };
        // The receiver may carry its own descriptor for the key.
        match find_own(target, key) {
            Some(Found::Accessor { setter: Some(s), .. }) => {
                self.call_function_object(&s, receiver.clone(), &[value])?;
                Ok(())
            }
            Some(Found::Accessor { setter: None, .. })
            | Some(Found::Data { writable: false, .. }) => Ok(()),
            Some(Found::Data { writable: true, .. }) => {
                let mut borrowed = target.borrow_mut();
                if let Some(prop) = borrowed.properties.get_mut(key) {
                    if let PropertyKind::Data { value: slot, .. } = &mut prop.kind {
                        *slot = value;
                    }
                }
                Ok(())
            }
            None => {
                let mut borrowed = target.borrow_mut();
                if !borrowed.extensible {
                    return Ok(());
                }
                note_index_key(&mut borrowed, key);
                borrowed.properties.insert(key.clone(), Property::data(value));
                Ok(())
            }
        }
    }

    /// Convenience: write a named property with the object itself as receiver.
    pub fn set_named(
        &mut self,
        obj: &JsObjectRef,
        name: &str,
        value: JsValue,
    ) -> Result<(), JsError> {
        let receiver = JsValue::Object(obj.cheap_clone());
        self.set(obj, &PropertyKey::from(name), value, &receiver)
    }

    /// Whether `key` exists on `obj` or anywhere on its prototype chain.
    pub fn has_property(&self, obj: &JsObjectRef, key: &PropertyKey) -> bool {
        let mut cursor = Some(obj.cheap_clone());
        while let Some(current) = cursor {
            if current.borrow().has_own_property(key) {
                return true;
            }
            cursor = proto_of(&current);
        }
        false
    }

    /// `value instanceof ctor`: walk the value's prototype chain looking for
    /// the constructor's `prototype` object.
    pub fn instance_of_value(
        &mut self,
        value: &JsValue,
        ctor: &JsObjectRef,
    ) -> Result<bool, JsError> {
        let target = self.get_named(ctor, "prototype")?;
        let Some(target) = target.as_object() else {
            return Err(JsError::type_error(
                "Right-hand side of 'instanceof' has no prototype object",
            ));
        };
        let Some(obj) = value.as_object() else {
            return Ok(false);
        };
        let mut cursor = proto_of(obj);
        while let Some(current) = cursor {
            if std::rc::Rc::ptr_eq(&current, target) {
                return Ok(true);
            }
            cursor = proto_of(&current);
        }
        Ok(false)
    }
}

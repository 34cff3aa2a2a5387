//! Object and property model behavior through the script-visible surface.

use std::cell::RefCell;
use std::rc::Rc;

use hostjs::{
    JsValue, Property, PropertyKey, Runtime, define_own_property, delete_property,
};

fn object_static(rt: &mut Runtime, name: &str) -> JsValue {
    let global = rt.global().clone();
    let object = rt.get_named(&global, "Object").unwrap();
    let ctor = object.as_object().unwrap().clone();
    rt.get_named(&ctor, name).unwrap()
}

fn keys_of(rt: &mut Runtime, value: &JsValue) -> Vec<String> {
    let keys_fn = object_static(rt, "keys");
    let result = rt
        .call(&keys_fn, JsValue::Undefined, &[value.clone()])
        .unwrap();
    let arr = result.as_object().unwrap().clone();
    let len = arr.borrow().array_length().unwrap();
    (0..len)
        .map(|i| {
            rt.get(&arr, &PropertyKey::Index(i), &result)
                .unwrap()
                .to_js_string()
                .to_string()
        })
        .collect()
}

#[test]
fn test_object_keys_index_keys_sort_before_named() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    {
        let mut borrowed = obj.borrow_mut();
        borrowed.set_own("zeta", 1.0);
        borrowed.set_own(PropertyKey::Index(10), 2.0);
        borrowed.set_own("alpha", 3.0);
        borrowed.set_own(PropertyKey::Index(2), 4.0);
    }
    let value = JsValue::Object(obj);
    assert_eq!(keys_of(&mut rt, &value), vec!["2", "10", "zeta", "alpha"]);
}

#[test]
fn test_object_keys_skips_non_enumerable_and_symbols() {
    let mut rt = Runtime::new();
    let sym = rt.new_symbol(Some(String::from("hidden")));
    let obj = rt.new_object();
    {
        let mut borrowed = obj.borrow_mut();
        borrowed.set_own("visible", true);
        borrowed.put_prop("internal", true);
        borrowed.set_own(PropertyKey::Symbol(sym), true);
    }
    let value = JsValue::Object(obj);
    assert_eq!(keys_of(&mut rt, &value), vec!["visible"]);
}

#[test]
fn test_object_values_runs_getters() {
    let mut rt = Runtime::new();
    let getter = rt.new_native_function(
        "get answer",
        Rc::new(|_rt, _call| Ok(JsValue::Number(42.0))),
        0,
    );
    let obj = rt.new_object();
    define_own_property(
        &obj,
        PropertyKey::from("answer"),
        Property::accessor(Some(getter), None),
    )
    .unwrap();
    obj.borrow_mut().set_own("plain", 7.0);

    let values_fn = object_static(&mut rt, "values");
    let result = rt
        .call(&values_fn, JsValue::Undefined, &[JsValue::Object(obj)])
        .unwrap();
    let arr = result.as_object().unwrap().clone();
    assert_eq!(
        rt.get(&arr, &PropertyKey::Index(0), &result).unwrap(),
        JsValue::Number(42.0)
    );
    assert_eq!(
        rt.get(&arr, &PropertyKey::Index(1), &result).unwrap(),
        JsValue::Number(7.0)
    );
}

#[test]
fn test_from_entries_later_pairs_win() {
    let mut rt = Runtime::new();
    let pair = |rt: &mut Runtime, k: &str, v: f64| {
        JsValue::Object(rt.new_array(vec![JsValue::from(k), JsValue::Number(v)]))
    };
    let a = pair(&mut rt, "x", 1.0);
    let b = pair(&mut rt, "y", 2.0);
    let c = pair(&mut rt, "x", 3.0);
    let entries = JsValue::Object(rt.new_array(vec![a, b, c]));

    let from_entries = object_static(&mut rt, "fromEntries");
    let result = rt
        .call(&from_entries, JsValue::Undefined, &[entries])
        .unwrap();
    let obj = result.as_object().unwrap().clone();
    assert_eq!(rt.get_named(&obj, "x").unwrap(), JsValue::Number(3.0));
    assert_eq!(rt.get_named(&obj, "y").unwrap(), JsValue::Number(2.0));
    assert_eq!(keys_of(&mut rt, &result), vec!["x", "y"]);
}

#[test]
fn test_object_create_null_prototype_and_descriptors() {
    let mut rt = Runtime::new();
    let descs = rt.new_object();
    {
        let value_desc = rt.new_object();
        value_desc.borrow_mut().set_own("value", 5.0);
        value_desc.borrow_mut().set_own("enumerable", true);
        descs.borrow_mut().set_own("shown", JsValue::Object(value_desc));

        let hidden_desc = rt.new_object();
        hidden_desc.borrow_mut().set_own("value", 6.0);
        descs
            .borrow_mut()
            .set_own("hidden", JsValue::Object(hidden_desc));
    }

    let create = object_static(&mut rt, "create");
    let result = rt
        .call(
            &create,
            JsValue::Undefined,
            &[JsValue::Null, JsValue::Object(descs)],
        )
        .unwrap();
    let obj = result.as_object().unwrap().clone();
    assert!(obj.borrow().prototype.is_none());
    // Descriptor flags default to false, so only "shown" enumerates.
    assert_eq!(keys_of(&mut rt, &result), vec!["shown"]);
    assert_eq!(rt.get_named(&obj, "hidden").unwrap(), JsValue::Number(6.0));
}

#[test]
fn test_object_create_rejects_primitive_prototype() {
    let mut rt = Runtime::new();
    let create = object_static(&mut rt, "create");
    let err = rt
        .call(&create, JsValue::Undefined, &[JsValue::Number(1.0)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Object prototype may only be an Object or null"
    );
}

#[test]
fn test_get_own_property_descriptor_reflects_flags() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    define_own_property(
        &obj,
        PropertyKey::from("pinned"),
        Property::with_attributes(JsValue::Number(9.0), false, true, false),
    )
    .unwrap();

    let gopd = object_static(&mut rt, "getOwnPropertyDescriptor");
    let desc = rt
        .call(
            &gopd,
            JsValue::Undefined,
            &[JsValue::Object(obj), JsValue::from("pinned")],
        )
        .unwrap();
    let desc = desc.as_object().unwrap().clone();
    assert_eq!(rt.get_named(&desc, "value").unwrap(), JsValue::Number(9.0));
    assert_eq!(
        rt.get_named(&desc, "writable").unwrap(),
        JsValue::Boolean(false)
    );
    assert_eq!(
        rt.get_named(&desc, "enumerable").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(
        rt.get_named(&desc, "configurable").unwrap(),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_has_own_property_ignores_prototype() {
    let mut rt = Runtime::new();
    let proto = rt.new_object();
    proto.borrow_mut().set_own("inherited", true);
    let obj = rt.new_bare_object(Some(proto));
    obj.borrow_mut().set_own("own", true);

    let has_own = rt.get_named(&obj, "hasOwnProperty").unwrap();
    let this = JsValue::Object(obj);
    let own = rt
        .call(&has_own, this.clone(), &[JsValue::from("own")])
        .unwrap();
    let inherited = rt
        .call(&has_own, this, &[JsValue::from("inherited")])
        .unwrap();
    assert_eq!(own, JsValue::Boolean(true));
    assert_eq!(inherited, JsValue::Boolean(false));
}

#[test]
fn test_prototype_chain_get_and_shadowing_set() {
    let mut rt = Runtime::new();
    let proto = rt.new_object();
    proto.borrow_mut().set_own("shared", 1.0);
    let obj = rt.new_bare_object(Some(proto.clone()));

    assert_eq!(rt.get_named(&obj, "shared").unwrap(), JsValue::Number(1.0));

    // Writing through the chain shadows on the receiver.
    rt.set_named(&obj, "shared", JsValue::Number(2.0)).unwrap();
    assert_eq!(rt.get_named(&obj, "shared").unwrap(), JsValue::Number(2.0));
    assert_eq!(
        rt.get_named(&proto, "shared").unwrap(),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_set_veto_on_non_writable_is_silent() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    define_own_property(
        &obj,
        PropertyKey::from("frozen"),
        Property::with_attributes(JsValue::Number(1.0), false, true, true),
    )
    .unwrap();
    rt.set_named(&obj, "frozen", JsValue::Number(2.0)).unwrap();
    assert_eq!(rt.get_named(&obj, "frozen").unwrap(), JsValue::Number(1.0));
}

#[test]
fn test_define_setter_installs_accessor_and_keeps_getter() {
    let mut rt = Runtime::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let obj = rt.new_object();

    let getter = rt.new_native_function(
        "get field",
        Rc::new(|_rt, _call| Ok(JsValue::from("from getter"))),
        0,
    );
    define_own_property(
        &obj,
        PropertyKey::from("field"),
        Property::accessor(Some(getter), None),
    )
    .unwrap();

    let setter = {
        let seen = seen.clone();
        rt.new_native_function(
            "set field",
            Rc::new(move |_rt, call| {
                seen.borrow_mut().push(call.argument(0));
                Ok(JsValue::Undefined)
            }),
            1,
        )
    };

    let define_setter = rt.get_named(&obj, "__defineSetter__").unwrap();
    let this = JsValue::Object(obj.clone());
    rt.call(
        &define_setter,
        this,
        &[JsValue::from("field"), JsValue::Object(setter)],
    )
    .unwrap();

    rt.set_named(&obj, "field", JsValue::Number(3.0)).unwrap();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0], JsValue::Number(3.0));
    // The pre-existing getter survives.
    assert_eq!(
        rt.get_named(&obj, "field").unwrap(),
        JsValue::from("from getter")
    );
}

#[test]
fn test_define_setter_rejects_non_function() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    let define_setter = rt.get_named(&obj, "__defineSetter__").unwrap();
    let this = JsValue::Object(obj);
    let err = rt
        .call(
            &define_setter,
            this,
            &[JsValue::from("field"), JsValue::Number(1.0)],
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Object.prototype.__defineSetter__: Expecting function"
    );
}

#[test]
fn test_to_string_tags() {
    let mut rt = Runtime::new();
    let proto = rt.object_prototype().clone();
    let to_string = rt.get_named(&proto, "toString").unwrap();

    let plain = JsValue::Object(rt.new_object());
    let arr = JsValue::Object(rt.new_array(vec![]));
    let args = JsValue::Object(rt.new_arguments(&[]));

    let cases = [
        (JsValue::Undefined, "[object Undefined]"),
        (JsValue::Null, "[object Null]"),
        (JsValue::Boolean(true), "[object Boolean]"),
        (JsValue::Number(1.0), "[object Number]"),
        (JsValue::from("s"), "[object String]"),
        (plain, "[object Object]"),
        (arr, "[object Array]"),
        (args, "[object Arguments]"),
    ];
    for (value, expected) in cases {
        let result = rt.call(&to_string, value, &[]).unwrap();
        assert_eq!(result.to_js_string().as_str(), expected);
    }
}

#[test]
fn test_to_string_uses_class_tag() {
    let mut rt = Runtime::new();
    let date = rt.new_object_with_class("Date");
    let proto = rt.object_prototype().clone();
    let to_string = rt.get_named(&proto, "toString").unwrap();
    let result = rt.call(&to_string, JsValue::Object(date), &[]).unwrap();
    assert_eq!(result.to_js_string().as_str(), "[object Date]");
}

#[test]
fn test_object_constructor_prototype_is_locked_down() {
    let mut rt = Runtime::new();
    let global = rt.global().clone();
    let object_ctor = rt.get_named(&global, "Object").unwrap();

    let gopd = object_static(&mut rt, "getOwnPropertyDescriptor");
    let desc = rt
        .call(
            &gopd,
            JsValue::Undefined,
            &[object_ctor, JsValue::from("prototype")],
        )
        .unwrap();
    let desc = desc.as_object().unwrap().clone();
    assert_eq!(
        rt.get_named(&desc, "writable").unwrap(),
        JsValue::Boolean(false)
    );
    assert_eq!(
        rt.get_named(&desc, "enumerable").unwrap(),
        JsValue::Boolean(false)
    );
    assert_eq!(
        rt.get_named(&desc, "configurable").unwrap(),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_setter_without_getter_reads_back_undefined() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();

    let setter = {
        let obj = obj.clone();
        rt.new_native_function(
            "set value",
            Rc::new(move |_rt, call| {
                obj.borrow_mut().set_own("effect", call.argument(0));
                Ok(JsValue::Undefined)
            }),
            1,
        )
    };

    let define_setter = rt.get_named(&obj, "__defineSetter__").unwrap();
    rt.call(
        &define_setter,
        JsValue::Object(obj.clone()),
        &[JsValue::from("value"), JsValue::Object(setter)],
    )
    .unwrap();

    rt.set_named(&obj, "value", JsValue::Number(5.0)).unwrap();
    assert_eq!(rt.get_named(&obj, "value").unwrap(), JsValue::Undefined);
    assert_eq!(rt.get_named(&obj, "effect").unwrap(), JsValue::Number(5.0));
}

#[test]
fn test_to_string_tag_symbol_override() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    let key = PropertyKey::Symbol(rt.symbols().to_string_tag.clone());
    obj.borrow_mut().set_own(key, "Custom");

    let proto = rt.object_prototype().clone();
    let to_string = rt.get_named(&proto, "toString").unwrap();
    let result = rt.call(&to_string, JsValue::Object(obj), &[]).unwrap();
    assert_eq!(result.to_js_string().as_str(), "[object Custom]");

    // A non-string tag falls back to the class.
    let other = rt.new_object();
    let key = PropertyKey::Symbol(rt.symbols().to_string_tag.clone());
    other.borrow_mut().set_own(key, 5.0);
    let result = rt.call(&to_string, JsValue::Object(other), &[]).unwrap();
    assert_eq!(result.to_js_string().as_str(), "[object Object]");
}

#[test]
fn test_arguments_enumerates_in_order() {
    let mut rt = Runtime::new();
    let args = rt.new_arguments(&[
        JsValue::from("a"),
        JsValue::from("b"),
        JsValue::from("c"),
    ]);
    let value = JsValue::Object(args.clone());
    assert_eq!(keys_of(&mut rt, &value), vec!["0", "1", "2"]);
    assert_eq!(
        rt.get_named(&args, "length").unwrap(),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_array_length_tracks_index_definition() {
    let mut rt = Runtime::new();
    let arr = rt.new_array(vec![JsValue::Number(1.0)]);
    define_own_property(
        &arr,
        PropertyKey::Index(4),
        Property::data(JsValue::Number(5.0)),
    )
    .unwrap();
    assert_eq!(arr.borrow().array_length(), Some(5));
    assert_eq!(
        rt.get_named(&arr, "length").unwrap(),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_delete_respects_configurability() {
    let mut rt = Runtime::new();
    let obj = rt.new_object();
    obj.borrow_mut().set_own("soft", 1.0);
    define_own_property(
        &obj,
        PropertyKey::from("hard"),
        Property::with_attributes(JsValue::Number(2.0), true, true, false),
    )
    .unwrap();

    assert!(delete_property(&obj, &PropertyKey::from("soft")));
    assert!(!delete_property(&obj, &PropertyKey::from("hard")));
    assert!(!obj.borrow().has_own_property(&PropertyKey::from("soft")));
    assert!(obj.borrow().has_own_property(&PropertyKey::from("hard")));
}

#[test]
fn test_instance_of_error_chain() {
    let mut rt = Runtime::new();
    let global = rt.global().clone();
    let error_ctor = rt.get_named(&global, "Error").unwrap();
    let error_ctor = error_ctor.as_object().unwrap().clone();

    let instance = rt.construct(&error_ctor, &[JsValue::from("boom")]).unwrap();
    assert!(rt.instance_of_value(&instance, &error_ctor).unwrap());
    assert_eq!(
        instance.to_js_string().as_str(),
        "Error: boom"
    );

    let plain = JsValue::Object(rt.new_object());
    assert!(!rt.instance_of_value(&plain, &error_ctor).unwrap());
}

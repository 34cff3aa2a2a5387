//! JavaScript value representation
//!
//! The core JsValue type and related structures for representing JavaScript
//! values at runtime: primitive variants, the shared object reference, the
//! ordered property table and its descriptors, and the host-value attachment
//! used by the native bridge.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::JsError;
use crate::prelude::{IndexMap, index_map_new};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Makes it explicit when a clone is just a reference count increment rather
/// than a copy of data. Types implementing this trait should have O(1) clone
/// operations, typically because they wrap `Rc`.
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObjectRef),
}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    /// Get the object reference, if this is an object
    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object", // Historical quirk
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Symbol(_) => true,
            JsValue::Object(_) => true,
        }
    }

    /// Convert to string (ToString). Objects format through their own
    /// `name`/`message` data properties when present, `[object Object]`
    /// otherwise; accessor-driven conversion goes through the runtime.
    pub fn to_js_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => {
                if n.is_nan() {
                    JsString::from("NaN")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        JsString::from("Infinity")
                    } else {
                        JsString::from("-Infinity")
                    }
                } else if *n == 0.0 {
                    JsString::from("0")
                } else {
                    JsString::from(n.to_string())
                }
            }
            JsValue::String(s) => s.cheap_clone(),
            JsValue::Symbol(s) => match &s.description {
                Some(desc) => JsString::from(format!("Symbol({})", desc)),
                None => JsString::from("Symbol()"),
            },
            JsValue::Object(obj) => {
                let obj = obj.borrow();
                if obj.class.as_str() == "Error" {
                    return JsString::from(obj.error_display());
                }
                JsString::from("[object Object]")
            }
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => {
                // NaN !== NaN
                if a.is_nan() || b.is_nan() {
                    false
                } else {
                    a == b
                }
            }
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_ref()),
            JsValue::Symbol(s) => match &s.description {
                Some(desc) => write!(f, "Symbol({})", desc),
                None => write!(f, "Symbol()"),
            },
            JsValue::Object(obj) => {
                let obj = obj.borrow();
                match &obj.exotic {
                    ExoticObject::Ordinary => write!(f, "[object {}]", obj.class),
                    ExoticObject::Array { length } => write!(f, "[array; {}]", length),
                    ExoticObject::Arguments => write!(f, "[arguments]"),
                    ExoticObject::Function(func) => {
                        write!(f, "[Function: {}]", func.name)
                    }
                }
            }
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JavaScript Symbol primitive
///
/// Symbols are unique identifiers, optionally with a description. Identity
/// is the id, allocated by the owning Runtime.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    pub description: Option<String>,
}

impl JsSymbol {
    pub fn new(id: u64, description: Option<String>) -> Self {
        Self { id, description }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Reference to a shared, mutable object
pub type JsObjectRef = Rc<RefCell<JsObject>>;

/// Property key (string, canonical array index, or symbol)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Build a key from an arbitrary value, canonicalizing integer strings
    pub fn from_value(value: &JsValue) -> Self {
        match value {
            JsValue::Number(n) => {
                let idx = *n as u32;
                if idx as f64 == *n && *n >= 0.0 {
                    PropertyKey::Index(idx)
                } else {
                    PropertyKey::String(value.to_js_string())
                }
            }
            JsValue::String(s) => PropertyKey::from(s.as_str()),
            JsValue::Symbol(s) => PropertyKey::Symbol(s.clone()),
            _ => PropertyKey::String(value.to_js_string()),
        }
    }

    /// Check if this is a symbol key
    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        // Fast path: check first char is a digit before parsing
        if let Some(first) = s.bytes().next() {
            if first.is_ascii_digit() {
                if let Ok(idx) = s.parse::<u32>() {
                    // Only canonical forms become index keys ("010" stays a string)
                    if idx.to_string() == s {
                        return PropertyKey::Index(idx);
                    }
                }
            }
        }
        PropertyKey::String(JsString::from(s))
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<JsString> for PropertyKey {
    #[inline]
    fn from(s: JsString) -> Self {
        if let Some(first) = s.as_str().bytes().next() {
            if first.is_ascii_digit() {
                if let Ok(idx) = s.as_str().parse::<u32>() {
                    if idx.to_string() == s.as_str() {
                        return PropertyKey::Index(idx);
                    }
                }
            }
        }
        PropertyKey::String(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        PropertyKey::Index(idx)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Symbol(s) => match &s.description {
                Some(desc) => write!(f, "Symbol({})", desc),
                None => write!(f, "Symbol()"),
            },
        }
    }
}

/// The payload of a property descriptor: data or accessor, never both.
#[derive(Debug, Clone)]
pub enum PropertyKind {
    Data {
        value: JsValue,
        writable: bool,
    },
    Accessor {
        getter: Option<JsObjectRef>,
        setter: Option<JsObjectRef>,
    },
}

/// Object property descriptor
#[derive(Debug, Clone)]
pub struct Property {
    pub kind: PropertyKind,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Plain enumerable/writable/configurable data property
    pub fn data(value: JsValue) -> Self {
        Self {
            kind: PropertyKind::Data {
                value,
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// Data property with explicit attributes
    pub fn with_attributes(
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            kind: PropertyKind::Data { value, writable },
            enumerable,
            configurable,
        }
    }

    /// Accessor property with getter and/or setter
    pub fn accessor(getter: Option<JsObjectRef>, setter: Option<JsObjectRef>) -> Self {
        Self {
            kind: PropertyKind::Accessor { getter, setter },
            enumerable: true,
            configurable: true,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, PropertyKind::Accessor { .. })
    }

    /// The data value, or undefined for accessors
    pub fn value(&self) -> JsValue {
        match &self.kind {
            PropertyKind::Data { value, .. } => value.clone(),
            PropertyKind::Accessor { .. } => JsValue::Undefined,
        }
    }
}

/// Host-owned data attached to a script object by the native bridge.
///
/// Always an explicit tagged variant, never an implicit downcast: the bridge
/// knows which arm it stored and the host inspects it the same way.
#[derive(Clone)]
pub enum HostValue {
    /// Arbitrary host data
    Data(Rc<dyn Any>),
    /// A host error, kept for message/stack formatting
    Error(Rc<dyn std::error::Error>),
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Data(_) => write!(f, "HostValue::Data"),
            HostValue::Error(e) => write!(f, "HostValue::Error({})", e),
        }
    }
}

/// A JavaScript object
#[derive(Debug)]
pub struct JsObject {
    /// Prototype link
    pub prototype: Option<JsObjectRef>,
    /// Whether the object can have properties added
    pub extensible: bool,
    /// Internal class tag, used by Object.prototype.toString
    pub class: JsString,
    /// Host value attached by the native bridge
    pub wrapped: Option<HostValue>,
    /// Object properties, in insertion order
    pub properties: IndexMap<PropertyKey, Property>,
    /// Exotic object behavior
    pub exotic: ExoticObject,
}

impl JsObject {
    /// Create a new ordinary object
    pub fn new() -> Self {
        Self {
            prototype: None,
            extensible: true,
            class: JsString::from("Object"),
            wrapped: None,
            properties: index_map_new(),
            exotic: ExoticObject::Ordinary,
        }
    }

    /// Create a new ordinary object with a prototype
    pub fn with_prototype(prototype: JsObjectRef) -> Self {
        Self {
            prototype: Some(prototype),
            ..Self::new()
        }
    }

    /// Check if this object is callable
    pub fn is_callable(&self) -> bool {
        matches!(self.exotic, ExoticObject::Function(_))
    }

    /// Get an own property
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Check if object has own property
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// Install a data property with the bridge's default attributes
    /// (writable, non-enumerable, configurable).
    pub fn put_prop(&mut self, key: impl Into<PropertyKey>, value: impl Into<JsValue>) {
        self.properties.insert(
            key.into(),
            Property::with_attributes(value.into(), true, false, true),
        );
    }

    /// Install a plain enumerable data property.
    pub fn set_own(&mut self, key: impl Into<PropertyKey>, value: impl Into<JsValue>) {
        self.properties
            .insert(key.into(), Property::data(value.into()));
    }

    /// Own string-keyed enumerable keys: index keys ascending first, then
    /// named keys in insertion order. Symbols are excluded. This ordering is
    /// the basis for Object.keys/values/entries and for-in.
    pub fn own_enumerable_string_keys(&self) -> Vec<PropertyKey> {
        let mut index_keys: Vec<u32> = Vec::new();
        let mut named_keys: Vec<JsString> = Vec::new();
        for (key, prop) in &self.properties {
            if !prop.enumerable {
                continue;
            }
            match key {
                PropertyKey::Index(i) => index_keys.push(*i),
                PropertyKey::String(s) => named_keys.push(s.cheap_clone()),
                PropertyKey::Symbol(_) => {}
            }
        }
        index_keys.sort_unstable();
        index_keys
            .into_iter()
            .map(PropertyKey::Index)
            .chain(named_keys.into_iter().map(PropertyKey::String))
            .collect()
    }

    /// Array length, if this is an array exotic object
    pub fn array_length(&self) -> Option<u32> {
        match self.exotic {
            ExoticObject::Array { length } => Some(length),
            _ => None,
        }
    }

    /// The native function data, if this is a function object
    pub fn as_function(&self) -> Option<&NativeFunction> {
        match &self.exotic {
            ExoticObject::Function(f) => Some(f),
            _ => None,
        }
    }

    /// "Name: message" form read from data properties along the prototype
    /// chain, for error display without re-entering the runtime.
    pub fn error_display(&self) -> String {
        fn lookup(obj: &JsObject, key: &PropertyKey) -> Option<JsValue> {
            if let Some(prop) = obj.get_own_property(key) {
                return Some(prop.value());
            }
            let mut cursor = obj.prototype.clone();
            while let Some(current) = cursor {
                let borrowed = current.borrow();
                if let Some(prop) = borrowed.get_own_property(key) {
                    return Some(prop.value());
                }
                cursor = borrowed.prototype.clone();
            }
            None
        }

        let name = match lookup(self, &PropertyKey::from("name")) {
            Some(value) => value.to_js_string().to_string(),
            None => String::from("Error"),
        };
        let message = lookup(self, &PropertyKey::from("message"))
            .map(|value| value.to_js_string().to_string())
            .unwrap_or_default();
        if message.is_empty() {
            name
        } else {
            format!("{}: {}", name, message)
        }
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Exotic object behavior
#[derive(Debug)]
pub enum ExoticObject {
    /// Ordinary object
    Ordinary,
    /// Array exotic object
    Array { length: u32 },
    /// Arguments exotic object: index keys 0..n plus a length property
    Arguments,
    /// Function exotic object backed by a host callable
    Function(NativeFunction),
}

/// Arguments to a native function or constructor invocation
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub this: JsValue,
    pub arguments: Vec<JsValue>,
}

impl FunctionCall {
    pub fn new(this: JsValue, arguments: Vec<JsValue>) -> Self {
        Self { this, arguments }
    }

    /// Argument at position, or undefined
    pub fn argument(&self, idx: usize) -> JsValue {
        self.arguments.get(idx).cloned().unwrap_or(JsValue::Undefined)
    }
}

/// Native function signature: host code invoked from script or host
pub type NativeFn =
    Rc<dyn Fn(&mut crate::Runtime, FunctionCall) -> Result<JsValue, JsError>>;

/// Native constructor body: populates the freshly created instance
pub type NativeCtorFn =
    Rc<dyn Fn(&mut crate::Runtime, &[JsValue], &JsObjectRef) -> Result<(), JsError>>;

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: NativeFn,
    pub arity: usize,
    /// Present when the function may be used with `new`
    pub construct: Option<NativeCtorFn>,
    /// Display source location, for host-facing diagnostics
    pub file: Option<JsString>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

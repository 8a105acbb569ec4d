// src/host/object.rs
//! Ordinary host objects
//!
//! Own properties live in a `BTreeMap` for deterministic ordering. Borrows of
//! the property table are always released before a getter or setter runs, so
//! accessors may re-enter the object that owns them.

use crate::host::value::{PropertyKey, Value};
use crate::host::{object_face, FunctionRef, FunctionTarget, ObjectRef, ObjectTarget};
use crate::utils::errors::{HostError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Maximum prototype chain depth walked before giving up
const MAX_PROTOTYPE_CHAIN_DEPTH: usize = 1024;

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// Property descriptor: data or accessor
#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<FunctionRef>,
        set: Option<FunctionRef>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable data property
    pub fn data_frozen(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Enumerable, configurable accessor property
    pub fn accessor(get: Option<FunctionRef>, set: Option<FunctionRef>) -> Self {
        Self::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HostObject
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ObjectState {
    prototype: Value,
    extensible: bool,
    properties: BTreeMap<PropertyKey, PropertyDescriptor>,
}

/// An ordinary object
#[derive(Debug)]
pub struct HostObject {
    class_name: String,
    state: RefCell<ObjectState>,
}

impl Default for HostObject {
    fn default() -> Self {
        Self::with_class("Object")
    }
}

impl HostObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object reporting `class_name` (e.g. `Navigator`)
    pub fn with_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            state: RefCell::new(ObjectState {
                prototype: Value::Null,
                extensible: true,
                properties: BTreeMap::new(),
            }),
        }
    }

    /// Create an array holding `items` with a non-enumerable `length`
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        let array = Self::with_class("Array");
        let mut len: u32 = 0;
        {
            let mut state = array.state.borrow_mut();
            for item in items {
                state
                    .properties
                    .insert(PropertyKey::from(len), PropertyDescriptor::data(item));
                len += 1;
            }
            state.properties.insert(
                PropertyKey::from("length"),
                PropertyDescriptor::Data {
                    value: Value::from(len),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        array
    }

    /// Builder-style data property
    pub fn with_property(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.state
            .borrow_mut()
            .properties
            .insert(key.into(), PropertyDescriptor::data(value));
        self
    }

    /// Builder-style property with an explicit descriptor
    pub fn with_descriptor(self, key: impl Into<PropertyKey>, desc: PropertyDescriptor) -> Self {
        self.state.borrow_mut().properties.insert(key.into(), desc);
        self
    }

    /// Builder-style prototype
    pub fn with_prototype(self, proto: Value) -> Self {
        self.state.borrow_mut().prototype = proto;
        self
    }

    pub fn into_ref(self) -> ObjectRef {
        Rc::new(self)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.into_ref())
    }

    fn own(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.state.borrow().properties.get(key).cloned()
    }

    fn prototype(&self) -> Value {
        self.state.borrow().prototype.clone()
    }

    fn is_array(&self) -> bool {
        self.class_name == "Array"
    }

    /// Keep `length` in step after writing an index
    fn grow_length(&self, key: &PropertyKey) {
        if !self.is_array() {
            return;
        }
        let Some(index) = key.as_index() else {
            return;
        };
        let mut state = self.state.borrow_mut();
        if let Some(PropertyDescriptor::Data { value, .. }) =
            state.properties.get_mut(&PropertyKey::from("length"))
        {
            let current = value.as_number().unwrap_or(0.0);
            if f64::from(index) >= current {
                *value = Value::from(index + 1);
            }
        }
    }

    /// Would setting `proto` create a prototype cycle through `self`?
    fn creates_cycle(&self, proto: &Value) -> Result<bool> {
        let me = self as *const Self;
        let mut current = proto.clone();
        for _ in 0..MAX_PROTOTYPE_CHAIN_DEPTH {
            let next = match &current {
                Value::Object(obj) => {
                    if std::ptr::addr_eq(Rc::as_ptr(obj), me) {
                        return Ok(true);
                    }
                    obj.get_prototype_of()?
                }
                Value::Function(func) => func.get_prototype_of()?,
                _ => return Ok(false),
            };
            current = next;
        }
        Err(HostError::range_error("Maximum prototype chain depth exceeded"))
    }
}

fn call_getter(getter: &Option<FunctionRef>, receiver: &Value) -> Result<Value> {
    match getter {
        Some(get) => get.call(receiver.clone(), Vec::new()),
        None => Ok(Value::Undefined),
    }
}

impl ObjectTarget for HostObject {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        match self.own(key) {
            Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
            Some(PropertyDescriptor::Accessor { get, .. }) => call_getter(&get, receiver),
            None => match object_face(&self.prototype()) {
                Some(proto) => proto.get(key, receiver),
                None => Ok(Value::Undefined),
            },
        }
    }

    fn set(&self, key: PropertyKey, value: Value, receiver: &Value) -> Result<bool> {
        match self.own(&key) {
            Some(PropertyDescriptor::Data { writable, .. }) => {
                if !writable {
                    return Ok(false);
                }
                if let Some(PropertyDescriptor::Data { value: slot, .. }) =
                    self.state.borrow_mut().properties.get_mut(&key)
                {
                    *slot = value;
                }
                self.grow_length(&key);
                Ok(true)
            }
            Some(PropertyDescriptor::Accessor { set, .. }) => match set {
                Some(setter) => {
                    setter.call(receiver.clone(), vec![value])?;
                    Ok(true)
                }
                None => Ok(false),
            },
            None => {
                // Inherited accessors and read-only data still govern the write.
                let mut current = self.prototype();
                for _ in 0..MAX_PROTOTYPE_CHAIN_DEPTH {
                    let Some(proto) = object_face(&current) else {
                        break;
                    };
                    match proto.get_own_property(&key)? {
                        Some(PropertyDescriptor::Accessor { set: Some(setter), .. }) => {
                            setter.call(receiver.clone(), vec![value])?;
                            return Ok(true);
                        }
                        Some(PropertyDescriptor::Accessor { set: None, .. }) => return Ok(false),
                        Some(desc) if !desc.is_writable() => return Ok(false),
                        Some(_) => break,
                        None => current = proto.get_prototype_of()?,
                    }
                }
                let mut state = self.state.borrow_mut();
                if !state.extensible {
                    return Ok(false);
                }
                state
                    .properties
                    .insert(key.clone(), PropertyDescriptor::data(value));
                drop(state);
                self.grow_length(&key);
                Ok(true)
            }
        }
    }

    fn has(&self, key: &PropertyKey) -> Result<bool> {
        if self.state.borrow().properties.contains_key(key) {
            return Ok(true);
        }
        match object_face(&self.prototype()) {
            Some(proto) => proto.has(key),
            None => Ok(false),
        }
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        let configurable = state.properties.get(key).map(PropertyDescriptor::is_configurable);
        match configurable {
            Some(false) => Ok(false),
            Some(true) => {
                state.properties.remove(key);
                Ok(true)
            }
            None => Ok(true),
        }
    }

    fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        match state.properties.get(&key) {
            Some(current) if !current.is_configurable() => {
                if desc.is_configurable()
                    || desc.is_enumerable() != current.is_enumerable()
                    || desc.is_data() != current.is_data()
                {
                    return Ok(false);
                }
                if let (
                    PropertyDescriptor::Data {
                        writable: false,
                        value: current_value,
                        ..
                    },
                    PropertyDescriptor::Data {
                        writable: new_writable,
                        value: new_value,
                        ..
                    },
                ) = (current, &desc)
                {
                    if *new_writable || !current_value.same_value(new_value) {
                        return Ok(false);
                    }
                }
                if let (
                    PropertyDescriptor::Accessor {
                        get: cur_get,
                        set: cur_set,
                        ..
                    },
                    PropertyDescriptor::Accessor {
                        get: new_get,
                        set: new_set,
                        ..
                    },
                ) = (current, &desc)
                {
                    let same = |a: &Option<FunctionRef>, b: &Option<FunctionRef>| match (a, b) {
                        (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
                        (None, None) => true,
                        _ => false,
                    };
                    if !same(cur_get, new_get) || !same(cur_set, new_set) {
                        return Ok(false);
                    }
                }
            }
            Some(_) => {}
            None if !state.extensible => return Ok(false),
            None => {}
        }
        state.properties.insert(key.clone(), desc);
        drop(state);
        self.grow_length(&key);
        Ok(true)
    }

    fn get_own_property(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>> {
        Ok(self.own(key))
    }

    /// Integer keys ascending, then string keys, then symbols
    fn own_keys(&self) -> Result<Vec<PropertyKey>> {
        let state = self.state.borrow();
        let mut indices: Vec<(u32, PropertyKey)> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in state.properties.keys() {
            match key {
                PropertyKey::String(_) => match key.as_index() {
                    Some(n) => indices.push((n, key.clone())),
                    None => strings.push(key.clone()),
                },
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
            }
        }
        indices.sort_by_key(|(n, _)| *n);
        let mut keys: Vec<PropertyKey> = indices.into_iter().map(|(_, k)| k).collect();
        keys.extend(strings);
        keys.extend(symbols);
        Ok(keys)
    }

    fn get_prototype_of(&self) -> Result<Value> {
        Ok(self.prototype())
    }

    fn set_prototype_of(&self, proto: Value) -> Result<bool> {
        if !matches!(proto, Value::Null | Value::Object(_) | Value::Function(_)) {
            return Err(HostError::type_error(format!(
                "Object prototype may only be an Object or null: {proto}"
            )));
        }
        if self.prototype().same_value(&proto) {
            return Ok(true);
        }
        if !self.state.borrow().extensible || self.creates_cycle(&proto)? {
            return Ok(false);
        }
        self.state.borrow_mut().prototype = proto;
        Ok(true)
    }

    fn prevent_extensions(&self) -> Result<bool> {
        self.state.borrow_mut().extensible = false;
        Ok(true)
    }

    fn is_extensible(&self) -> Result<bool> {
        Ok(self.state.borrow().extensible)
    }
}

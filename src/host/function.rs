// src/host/function.rs
//! Native functions backed by Rust closures

use crate::host::object::{HostObject, PropertyDescriptor};
use crate::host::value::{PropertyKey, Value};
use crate::host::{FunctionRef, FunctionTarget, ObjectTarget};
use crate::utils::errors::{HostError, Result};
use std::fmt;
use std::rc::Rc;

type CallFn = dyn Fn(&Value, &[Value]) -> Result<Value>;
type ConstructFn = dyn Fn(&[Value], &Value) -> Result<Value>;

/// A named callable with its own property table
pub struct NativeFunction {
    name: String,
    properties: HostObject,
    call: Box<CallFn>,
    construct: Option<Box<ConstructFn>>,
}

impl NativeFunction {
    /// Create a callable; `name` and `length` are installed read-only
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        let name = name.into();
        let properties = HostObject::with_class("Function")
            .with_descriptor(
                "name",
                PropertyDescriptor::Data {
                    value: Value::from(name.as_str()),
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            )
            .with_descriptor(
                "length",
                PropertyDescriptor::Data {
                    value: Value::from(0),
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            );
        Self {
            name,
            properties,
            call: Box::new(call),
            construct: None,
        }
    }

    /// Make the function usable with `new`; receives args and new-target
    pub fn with_construct<F>(mut self, construct: F) -> Self
    where
        F: Fn(&[Value], &Value) -> Result<Value> + 'static,
    {
        self.construct = Some(Box::new(construct));
        self
    }

    /// Builder-style own property (e.g. `prototype`)
    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.properties = self.properties.with_property(key, value);
        self
    }

    pub fn into_ref(self) -> FunctionRef {
        Rc::new(self)
    }

    pub fn into_value(self) -> Value {
        Value::Function(self.into_ref())
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("constructable", &self.construct.is_some())
            .finish()
    }
}

impl ObjectTarget for NativeFunction {
    fn class_name(&self) -> &str {
        "Function"
    }

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        self.properties.get(key, receiver)
    }

    fn set(&self, key: PropertyKey, value: Value, receiver: &Value) -> Result<bool> {
        self.properties.set(key, value, receiver)
    }

    fn has(&self, key: &PropertyKey) -> Result<bool> {
        self.properties.has(key)
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool> {
        self.properties.delete(key)
    }

    fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> Result<bool> {
        self.properties.define_property(key, desc)
    }

    fn get_own_property(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>> {
        self.properties.get_own_property(key)
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>> {
        self.properties.own_keys()
    }

    fn get_prototype_of(&self) -> Result<Value> {
        self.properties.get_prototype_of()
    }

    fn set_prototype_of(&self, proto: Value) -> Result<bool> {
        self.properties.set_prototype_of(proto)
    }

    fn prevent_extensions(&self) -> Result<bool> {
        self.properties.prevent_extensions()
    }

    fn is_extensible(&self) -> Result<bool> {
        self.properties.is_extensible()
    }
}

impl FunctionTarget for NativeFunction {
    fn as_object(&self) -> &dyn ObjectTarget {
        self
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn call(&self, receiver: Value, args: Vec<Value>) -> Result<Value> {
        (self.call)(&receiver, args.as_slice())
    }

    fn construct(&self, args: Vec<Value>, new_target: Value) -> Result<Value> {
        match &self.construct {
            Some(construct) => construct(args.as_slice(), &new_target),
            None => Err(HostError::type_error(format!(
                "{} is not a constructor",
                self.name
            ))),
        }
    }
}

// src/host/mod.rs
//! Host value model
//!
//! The closed set of types an instrumented environment is built from. Every
//! structural operation a script can perform against a value is one method on
//! [`ObjectTarget`]; callables add invocation and construction through
//! [`FunctionTarget`]. Raw host values and their interception wrappers
//! implement the same traits, which is what makes a wrapper indistinguishable
//! from the value it stands in for.
//!
//! - **Value**: primitives plus reference-counted objects and functions
//! - **HostObject**: ordinary objects with descriptors and prototype chains
//! - **NativeFunction**: named callables backed by Rust closures

pub mod function;
pub mod object;
pub mod value;

pub use function::NativeFunction;
pub use object::{HostObject, PropertyDescriptor};
pub use value::{format_number, PropertyKey, Symbol, Value, WellKnownSymbol};

use crate::utils::errors::Result;
use std::fmt;
use std::rc::Rc;

/// Shared reference to an object
pub type ObjectRef = Rc<dyn ObjectTarget>;

/// Shared reference to a callable
pub type FunctionRef = Rc<dyn FunctionTarget>;

/// Structural operations on an object
///
/// Mirrors the reflective operations of the host: each method is the
/// unintercepted primitive an interception layer forwards to.
pub trait ObjectTarget: fmt::Debug {
    /// Class tag reported by string coercion (`[object <class>]`)
    fn class_name(&self) -> &str;

    /// `[[Get]]`; accessors run with `receiver` as `this`
    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value>;

    /// `[[Set]]`; returns the success flag
    fn set(&self, key: PropertyKey, value: Value, receiver: &Value) -> Result<bool>;

    /// `[[HasProperty]]` (walks the prototype chain)
    fn has(&self, key: &PropertyKey) -> Result<bool>;

    /// `[[Delete]]`
    fn delete(&self, key: &PropertyKey) -> Result<bool>;

    /// `[[DefineOwnProperty]]`
    fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> Result<bool>;

    /// `[[GetOwnProperty]]`
    fn get_own_property(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>>;

    /// `[[OwnPropertyKeys]]`
    fn own_keys(&self) -> Result<Vec<PropertyKey>>;

    /// `[[GetPrototypeOf]]`; `Value::Null` ends the chain
    fn get_prototype_of(&self) -> Result<Value>;

    /// `[[SetPrototypeOf]]`
    fn set_prototype_of(&self, proto: Value) -> Result<bool>;

    /// `[[PreventExtensions]]`
    fn prevent_extensions(&self) -> Result<bool>;

    /// `[[IsExtensible]]`
    fn is_extensible(&self) -> Result<bool>;

    /// Value an interception wrapper stands in for; `None` for raw values
    fn proxy_target(&self) -> Option<Value> {
        None
    }
}

/// A callable object
pub trait FunctionTarget: ObjectTarget {
    /// View this function through its object face
    fn as_object(&self) -> &dyn ObjectTarget;

    /// Declared name
    fn name(&self) -> String;

    /// `[[Call]]`
    fn call(&self, receiver: Value, args: Vec<Value>) -> Result<Value>;

    /// `[[Construct]]`
    fn construct(&self, args: Vec<Value>, new_target: Value) -> Result<Value>;
}

/// Strip interception wrappers, yielding the raw value underneath
pub fn unwrap_proxies(value: &Value) -> Value {
    let mut current = value.clone();
    loop {
        let inner = object_face(&current).and_then(|face| face.proxy_target());
        match inner {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

/// Structural face of any object-like value
pub fn object_face(value: &Value) -> Option<&dyn ObjectTarget> {
    match value {
        Value::Object(obj) => Some(obj.as_ref()),
        Value::Function(func) => Some(func.as_object()),
        _ => None,
    }
}

// src/interception/object_interceptor.rs
//! Object interceptor
//!
//! A [`WrappedObject`] stands in for one raw object at one access path. Every
//! structural operation is forwarded to the raw target; property-level traps
//! run the configured hooks, wrap any object or function they yield and emit
//! one event. Object-level traps (prototype and extensibility) are forwarded
//! and logged without hooks or key filtering.

use crate::host::{
    unwrap_proxies, FunctionRef, FunctionTarget, ObjectRef, ObjectTarget, PropertyDescriptor,
    PropertyKey, Value,
};
use crate::interception::function_interceptor::WrappedFunction;
use crate::recording::event::{Event, Operation};
use crate::recording::serializer;
use crate::utils::config::Config;
use crate::utils::errors::Result;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Wrap `value` at `path` if it is an object or a function
///
/// Primitives and nullish values are returned unchanged. A value that is
/// already a wrapper is re-wrapped around its raw target, never nested. Each
/// call produces a fresh wrapper; wrappers are never memoized.
pub fn wrap_value(value: Value, path: &str, config: &Rc<Config>) -> Value {
    match unwrap_proxies(&value) {
        Value::Object(object) => Value::Object(Rc::new(WrappedObject::new(
            object,
            path.to_string(),
            Rc::clone(config),
        ))),
        Value::Function(function) => Value::Function(Rc::new(WrappedFunction::new(
            function,
            path.to_string(),
            Rc::clone(config),
            true,
        ))),
        other => other,
    }
}

/// Raw value behind a wrapper
#[derive(Clone)]
enum RawTarget {
    Object(ObjectRef),
    Function(FunctionRef),
}

impl RawTarget {
    fn face(&self) -> &dyn ObjectTarget {
        match self {
            Self::Object(object) => object.as_ref(),
            Self::Function(function) => function.as_object(),
        }
    }

    /// The raw target as a receiver
    fn value(&self) -> Value {
        match self {
            Self::Object(object) => Value::Object(Rc::clone(object)),
            Self::Function(function) => Value::Function(Rc::clone(function)),
        }
    }
}

/// Interception wrapper for one object at one path
pub struct WrappedObject {
    raw: RawTarget,
    path: String,
    config: Rc<Config>,
}

impl WrappedObject {
    pub fn new(object: ObjectRef, path: String, config: Rc<Config>) -> Self {
        trace!(path = %path, "Wrapping object");
        Self {
            raw: RawTarget::Object(object),
            path,
            config,
        }
    }

    /// Property traps over a function's own object face
    pub(crate) fn for_function(function: FunctionRef, path: String, config: Rc<Config>) -> Self {
        Self {
            raw: RawTarget::Function(function),
            path,
            config,
        }
    }

    /// Access path of this wrapper
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &Rc<Config> {
        &self.config
    }

    /// The unwrapped target
    pub fn raw(&self) -> Value {
        self.raw.value()
    }

    fn member_path(&self, key: &PropertyKey) -> String {
        format!("{}.{}", self.path, key)
    }

    /// Keys outside the watched set and members of exempt subtrees skip the
    /// layer entirely
    fn bypassed(&self, key: &PropertyKey, member: &str) -> bool {
        let bypass = !self.config.is_watched(key) || self.config.is_exempt(member);
        if bypass {
            metrics::counter!("envtrace_bypass_total").increment(1);
            trace!(path = %member, "Bypassing interception");
        }
        bypass
    }

    fn emit(
        &self,
        operation: Operation,
        actor: &str,
        subject: Option<&PropertyKey>,
        detail: String,
        result: String,
    ) -> Result<()> {
        let event = Event::new(
            actor,
            operation,
            subject.map(ToString::to_string),
            detail,
            result,
        );
        self.config.emit(&event)
    }
}

impl ObjectTarget for WrappedObject {
    fn class_name(&self) -> &str {
        self.raw.face().class_name()
    }

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        let member = self.member_path(key);
        if self.bypassed(key, &member) {
            return self.raw.face().get(key, receiver);
        }

        let hooks = self.config.hooks();
        if let Some(hooks) = hooks {
            hooks.before_get(&self.path, key)?;
        }

        let raw_value = self.raw.face().get(key, receiver)?;
        let mut logged = raw_value.clone();
        let mut value = wrap_value(raw_value, &member, &self.config);

        if let Some(hooks) = hooks {
            if let Some(replacement) = hooks.after_get(&self.path, key, &value)? {
                // Handing the same wrapper back is not a substitution.
                if !replacement.is_nullish() && !replacement.same_value(&value) {
                    logged = replacement.clone();
                    value = wrap_value(replacement, &member, &self.config);
                }
            }
        }

        let rendered = self.config.render(&logged)?;
        self.emit(
            Operation::ReadProperty,
            &member,
            Some(key),
            key.to_string(),
            rendered,
        )?;
        Ok(value)
    }

    fn set(&self, key: PropertyKey, value: Value, receiver: &Value) -> Result<bool> {
        let member = self.member_path(&key);
        if self.bypassed(&key, &member) {
            return self.raw.face().set(key, value, receiver);
        }

        let hooks = self.config.hooks();
        let mut value = value;
        if let Some(hooks) = hooks {
            if let Some(replacement) = hooks.before_set(&self.path, &key, &value)? {
                value = replacement;
            }
        }

        let success = self.raw.face().set(key.clone(), value.clone(), receiver)?;

        if let Some(hooks) = hooks {
            hooks.after_set(&self.path, &key, &value)?;
        }

        let rendered = self.config.render(&value)?;
        self.emit(
            Operation::WriteProperty,
            &member,
            Some(&key),
            key.to_string(),
            rendered,
        )?;
        Ok(success)
    }

    fn has(&self, key: &PropertyKey) -> Result<bool> {
        let member = self.member_path(key);
        if self.bypassed(key, &member) {
            return self.raw.face().has(key);
        }

        let found = self.raw.face().has(key)?;
        self.emit(
            Operation::HasProperty,
            &member,
            Some(key),
            key.to_string(),
            found.to_string(),
        )?;
        Ok(found)
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool> {
        let member = self.member_path(key);
        if self.bypassed(key, &member) {
            return self.raw.face().delete(key);
        }

        let deleted = self.raw.face().delete(key)?;
        self.emit(
            Operation::DeleteProperty,
            &member,
            Some(key),
            key.to_string(),
            deleted.to_string(),
        )?;
        Ok(deleted)
    }

    fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> Result<bool> {
        let member = self.member_path(&key);
        if self.bypassed(&key, &member) {
            return self.raw.face().define_property(key, desc);
        }

        let attributes = self
            .config
            .apply_policy(serializer::serialize_descriptor(&desc))?;
        let defined = self.raw.face().define_property(key.clone(), desc)?;
        self.emit(
            Operation::DefineProperty,
            &member,
            Some(&key),
            format!("{key}, {attributes}"),
            defined.to_string(),
        )?;
        Ok(defined)
    }

    fn get_own_property(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>> {
        self.raw.face().get_own_property(key)
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>> {
        self.raw.face().own_keys()
    }

    fn get_prototype_of(&self) -> Result<Value> {
        let proto = self.raw.face().get_prototype_of()?;
        let rendered = self.config.render(&proto)?;
        self.emit(
            Operation::GetPrototype,
            &self.path,
            None,
            String::new(),
            rendered,
        )?;
        Ok(proto)
    }

    fn set_prototype_of(&self, proto: Value) -> Result<bool> {
        let detail = self.config.render(&proto)?;
        let success = self.raw.face().set_prototype_of(proto)?;
        self.emit(
            Operation::SetPrototype,
            &self.path,
            None,
            detail,
            success.to_string(),
        )?;
        Ok(success)
    }

    fn prevent_extensions(&self) -> Result<bool> {
        let success = self.raw.face().prevent_extensions()?;
        self.emit(
            Operation::PreventExtensions,
            &self.path,
            None,
            String::new(),
            success.to_string(),
        )?;
        Ok(success)
    }

    fn is_extensible(&self) -> Result<bool> {
        let extensible = self.raw.face().is_extensible()?;
        self.emit(
            Operation::IsExtensible,
            &self.path,
            None,
            String::new(),
            extensible.to_string(),
        )?;
        Ok(extensible)
    }

    fn proxy_target(&self) -> Option<Value> {
        Some(self.raw.value())
    }
}

impl fmt::Debug for WrappedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.raw.face(), f)
    }
}

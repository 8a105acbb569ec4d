// src/interception/function_interceptor.rs
//! Function interceptor
//!
//! A [`WrappedFunction`] intercepts invocation and construction of one raw
//! callable. Its own properties (`prototype`, `name`, ...) go through the
//! same traps as any wrapped object.

use crate::host::{FunctionRef, FunctionTarget, ObjectTarget, PropertyDescriptor, PropertyKey, Value};
use crate::interception::object_interceptor::{wrap_value, WrappedObject};
use crate::recording::event::{Event, Operation};
use crate::utils::config::Config;
use crate::utils::errors::Result;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Interception wrapper for one callable at one path
pub struct WrappedFunction {
    function: FunctionRef,
    object: WrappedObject,
    trap_calls: bool,
}

impl WrappedFunction {
    /// `trap_calls: false` yields a wrapper that only intercepts property
    /// traps and forwards calls untouched
    pub fn new(function: FunctionRef, path: String, config: Rc<Config>, trap_calls: bool) -> Self {
        trace!(path = %path, trap_calls, "Wrapping function");
        let object = WrappedObject::for_function(Rc::clone(&function), path, config);
        Self {
            function,
            object,
            trap_calls,
        }
    }

    pub fn path(&self) -> &str {
        self.object.path()
    }

    /// The unwrapped callable
    pub fn raw(&self) -> &FunctionRef {
        &self.function
    }

    fn config(&self) -> &Rc<Config> {
        self.object.config()
    }

    fn passthrough(&self) -> bool {
        !self.trap_calls || self.config().is_exempt(self.path())
    }

    /// Log detail for an invocation
    fn call_detail(&self, name: &str, args: &[Value]) -> Result<String> {
        let config = self.config();
        if config.condensed_calls.contains(name) {
            // Only the discriminator (e.g. the event type) is logged.
            let first = args.first().cloned().unwrap_or_default();
            return config.render(&first);
        }
        config.render_args(args)
    }

    fn emit(&self, operation: Operation, name: String, detail: String, result: String) -> Result<()> {
        let event = Event::new(self.path(), operation, Some(name), detail, result);
        self.config().emit(&event)
    }
}

impl ObjectTarget for WrappedFunction {
    fn class_name(&self) -> &str {
        self.object.class_name()
    }

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        self.object.get(key, receiver)
    }

    fn set(&self, key: PropertyKey, value: Value, receiver: &Value) -> Result<bool> {
        self.object.set(key, value, receiver)
    }

    fn has(&self, key: &PropertyKey) -> Result<bool> {
        self.object.has(key)
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool> {
        self.object.delete(key)
    }

    fn define_property(&self, key: PropertyKey, desc: PropertyDescriptor) -> Result<bool> {
        self.object.define_property(key, desc)
    }

    fn get_own_property(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>> {
        self.object.get_own_property(key)
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>> {
        self.object.own_keys()
    }

    fn get_prototype_of(&self) -> Result<Value> {
        self.object.get_prototype_of()
    }

    fn set_prototype_of(&self, proto: Value) -> Result<bool> {
        self.object.set_prototype_of(proto)
    }

    fn prevent_extensions(&self) -> Result<bool> {
        self.object.prevent_extensions()
    }

    fn is_extensible(&self) -> Result<bool> {
        self.object.is_extensible()
    }

    fn proxy_target(&self) -> Option<Value> {
        Some(Value::Function(Rc::clone(&self.function)))
    }
}

impl FunctionTarget for WrappedFunction {
    fn as_object(&self) -> &dyn ObjectTarget {
        self
    }

    fn name(&self) -> String {
        self.function.name()
    }

    fn call(&self, receiver: Value, args: Vec<Value>) -> Result<Value> {
        if self.passthrough() {
            return self.function.call(receiver, args);
        }

        let config = Rc::clone(self.config());
        let path = self.path();
        let receiver = if config.bind_receiver_to_target {
            Value::Function(Rc::clone(&self.function))
        } else {
            receiver
        };

        let hooks = config.hooks();
        let mut args = args;
        if let Some(hooks) = hooks {
            if let Some(replaced) = hooks.before_apply(path, &args)? {
                args = replaced;
            }
        }

        let raw_result = self.function.call(receiver, args.clone())?;
        let mut logged = raw_result.clone();
        let mut result = wrap_value(raw_result, path, &config);

        if let Some(hooks) = hooks {
            if let Some(replacement) = hooks.after_apply(path, &args, &result)? {
                if !replacement.is_nullish() && !replacement.same_value(&result) {
                    logged = replacement.clone();
                    result = wrap_value(replacement, path, &config);
                }
            }
        }

        let name = self.function.name();
        let detail = self.call_detail(&name, &args)?;
        let rendered = config.render(&logged)?;
        self.emit(Operation::Invoke, name, detail, rendered)?;
        Ok(result)
    }

    fn construct(&self, args: Vec<Value>, new_target: Value) -> Result<Value> {
        if self.passthrough() {
            return self.function.construct(args, new_target);
        }

        let config = Rc::clone(self.config());
        let instance = self.function.construct(args.clone(), new_target)?;

        let detail = config.render_args(&args)?;
        let rendered = config.render(&instance)?;
        self.emit(Operation::Construct, self.function.name(), detail, rendered)?;
        Ok(wrap_value(instance, self.path(), &config))
    }
}

impl fmt::Debug for WrappedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.function, f)
    }
}

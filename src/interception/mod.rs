// src/interception/mod.rs
//! Interception layer
//!
//! Wraps a live environment so every structural operation performed against
//! it is observed, optionally transformed by hooks, and logged, while the
//! wrapped values keep behaving exactly like the raw ones:
//!
//! - **Classifier**: decides what gets wrapped
//! - **Object Interceptor**: property and object-level traps
//! - **Function Interceptor**: invocation and construction
//! - **Hooks**: before/after strategy injected per tree
//!
//! # Architecture
//!
//! ```text
//! Observer code (unmodified)
//!     │
//!     ├─ env.navigator        → WrappedObject.get   → wrap(navigator)
//!     ├─ .userAgent           → WrappedObject.get   → "Mozilla/5.0"
//!     └─ .getBattery()        → WrappedFunction.call → wrap(result)
//!                                     │
//!                                     └─ Event → sink
//! ```

pub mod classifier;
pub mod function_interceptor;
pub mod hooks;
pub mod object_interceptor;

pub use classifier::{classify, ValueKind};
pub use function_interceptor::WrappedFunction;
pub use hooks::{HookSet, InterceptHooks};
pub use object_interceptor::{wrap_value, WrappedObject};

use crate::host::Value;
use crate::utils::config::{Config, InstrumentOptions, Mode};
use crate::utils::errors::{HostError, Result};
use std::rc::Rc;
use tracing::debug;

const NON_OBJECT_TARGET: &str = "Cannot create proxy with a non-object as target or handler";

/// Wrap `target` under `options`
///
/// A callable target in [`Mode::Method`] gets call interception; every other
/// object or function is wrapped as an object, which forwards calls untouched.
/// Primitive and nullish targets are rejected with the host's `TypeError`.
pub fn instrument(target: Value, options: InstrumentOptions) -> Result<Value> {
    let config = Rc::new(Config::from_options(options));
    let path = config.context_name.clone();
    debug!(
        "Instrumenting {} as {} (mode: {:?})",
        path,
        target.type_name(),
        config.mode
    );

    match target {
        Value::Function(function) => {
            let trap_calls = config.mode == Mode::Method;
            Ok(Value::Function(Rc::new(WrappedFunction::new(
                function, path, config, trap_calls,
            ))))
        }
        Value::Object(object) => Ok(Value::Object(Rc::new(WrappedObject::new(
            object, path, config,
        )))),
        _ => Err(HostError::type_error(NON_OBJECT_TARGET)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FunctionTarget, HostObject, NativeFunction, ObjectTarget, PropertyKey};
    use crate::utils::config::LogLevel;
    use std::cell::RefCell;

    fn counting(options: InstrumentOptions) -> (InstrumentOptions, Rc<RefCell<usize>>) {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let options = options.with_log_level(LogLevel::events(move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        }));
        (options, count)
    }

    #[test]
    fn test_primitive_target_rejected() {
        for target in [Value::Undefined, Value::Null, Value::from(1), Value::from("env")] {
            let err = instrument(target, InstrumentOptions::new("env")).unwrap_err();
            assert_eq!(
                err.to_string(),
                "TypeError: Cannot create proxy with a non-object as target or handler"
            );
        }
    }

    #[test]
    fn test_method_mode_traps_calls() {
        let ping = NativeFunction::new("ping", |_, _| Ok(Value::from("pong"))).into_value();
        let (options, count) = counting(InstrumentOptions::new("ping").with_mode(Mode::Method));

        let wrapped = instrument(ping, options).unwrap();
        let result = wrapped
            .as_function()
            .unwrap()
            .call(Value::Undefined, Vec::new())
            .unwrap();
        assert_eq!(result, Value::from("pong"));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_object_mode_function_forwards_calls() {
        let ping = NativeFunction::new("ping", |_, _| Ok(Value::from("pong"))).into_value();
        let (options, count) = counting(InstrumentOptions::new("ping"));

        let wrapped = instrument(ping, options).unwrap();
        let func = wrapped.as_function().unwrap();
        func.call(Value::Undefined, Vec::new()).unwrap();
        assert_eq!(*count.borrow(), 0);

        func.get(&PropertyKey::from("name"), &wrapped).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_method_mode_object_falls_back() {
        let env = HostObject::new().with_property("x", 1).into_value();
        let (options, count) = counting(InstrumentOptions::new("env").with_mode(Mode::Method));

        let wrapped = instrument(env, options).unwrap();
        assert!(wrapped.is_object());
        wrapped
            .as_object()
            .unwrap()
            .get(&PropertyKey::from("x"), &wrapped)
            .unwrap();
        assert_eq!(*count.borrow(), 1);
    }
}

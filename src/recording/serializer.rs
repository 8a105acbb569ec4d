// src/recording/serializer.rs
//! Log-value serialization
//!
//! Objects go through structural (JSON) serialization with no recovery: a
//! cycle or a BigInt member fails with the same `TypeError` the host's own
//! serializer raises, and that failure is returned to the caller as-is.
//! Everything else uses plain string coercion.
//!
//! Interception wrappers are looked through: members are read from the raw
//! target, so rendering never re-enters a trap. Nesting depth and re-entrant
//! renders (accessors that log while being logged) are both bounded and fail
//! with the host's stack-exhaustion `RangeError`.

use crate::host::{unwrap_proxies, ObjectTarget, PropertyDescriptor, PropertyKey, Value};
use crate::interception::classifier::{classify, ValueKind};
use crate::utils::errors::{HostError, Result, SerializeError};
use serde_json::{Map, Number, Value as Json};
use std::cell::Cell;
use std::rc::Rc;

/// Deepest object nesting rendered before giving up
const MAX_DEPTH: usize = 512;

/// Renders allowed to be in flight at once on one thread
const MAX_ACTIVE_RENDERS: usize = 32;

thread_local! {
    static ACTIVE_RENDERS: Cell<usize> = const { Cell::new(0) };
}

fn stack_exhausted() -> HostError {
    HostError::range_error("Maximum call stack size exceeded")
}

/// Counts one in-flight render for as long as it lives
struct RenderGuard;

impl RenderGuard {
    fn enter() -> Result<Self> {
        ACTIVE_RENDERS.with(|active| {
            if active.get() >= MAX_ACTIVE_RENDERS {
                return Err(stack_exhausted());
            }
            active.set(active.get() + 1);
            Ok(RenderGuard)
        })
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        ACTIVE_RENDERS.with(|active| active.set(active.get().saturating_sub(1)));
    }
}

/// Render any value for a single log line
pub fn serialize(value: &Value) -> Result<String> {
    match classify(value) {
        ValueKind::Nullish | ValueKind::Primitive | ValueKind::Callable => Ok(value.to_string()),
        ValueKind::Object => {
            let _guard = RenderGuard::enter()?;
            let json = to_json(value, &mut Vec::new())?.unwrap_or(Json::Null);
            Ok(json.to_string())
        }
    }
}

/// Render an argument list as a JSON array
pub fn serialize_args(args: &[Value]) -> Result<String> {
    let _guard = RenderGuard::enter()?;
    let mut stack = Vec::new();
    let mut items = Vec::with_capacity(args.len());
    for arg in args {
        items.push(to_json(arg, &mut stack)?.unwrap_or(Json::Null));
    }
    Ok(Json::Array(items).to_string())
}

/// Render a property descriptor the way its object form serializes
pub fn serialize_descriptor(desc: &PropertyDescriptor) -> Result<String> {
    let _guard = RenderGuard::enter()?;
    let mut map = Map::new();
    match desc {
        PropertyDescriptor::Data {
            value,
            writable,
            enumerable,
            configurable,
        } => {
            map.insert("configurable".to_string(), Json::Bool(*configurable));
            map.insert("enumerable".to_string(), Json::Bool(*enumerable));
            if let Some(json) = to_json(value, &mut Vec::new())? {
                map.insert("value".to_string(), json);
            }
            map.insert("writable".to_string(), Json::Bool(*writable));
        }
        // Getter and setter functions have no JSON form.
        PropertyDescriptor::Accessor {
            enumerable,
            configurable,
            ..
        } => {
            map.insert("configurable".to_string(), Json::Bool(*configurable));
            map.insert("enumerable".to_string(), Json::Bool(*enumerable));
        }
    }
    Ok(Json::Object(map).to_string())
}

fn number_to_json(n: f64) -> Json {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return Json::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

/// `None` marks values the structural form skips (undefined, functions,
/// symbols)
fn to_json(value: &Value, stack: &mut Vec<*const ()>) -> Result<Option<Json>> {
    let json = match value {
        Value::Undefined | Value::Function(_) | Value::Symbol(_) => return Ok(None),
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::BigInt(_) => return Err(SerializeError::BigInt.into()),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Object(_) => {
            let raw = unwrap_proxies(value);
            let Value::Object(obj) = &raw else {
                return to_json(&raw, stack);
            };
            let addr = Rc::as_ptr(obj) as *const ();
            if stack.contains(&addr) {
                return Err(SerializeError::CircularStructure.into());
            }
            if stack.len() >= MAX_DEPTH {
                return Err(stack_exhausted());
            }
            stack.push(addr);
            let result = if obj.class_name() == "Array" {
                array_to_json(obj.as_ref(), &raw, stack)
            } else {
                object_to_json(obj.as_ref(), &raw, stack)
            };
            stack.pop();
            result?
        }
    };
    Ok(Some(json))
}

fn array_to_json(
    array: &dyn ObjectTarget,
    receiver: &Value,
    stack: &mut Vec<*const ()>,
) -> Result<Json> {
    let len = array
        .get(&PropertyKey::from("length"), receiver)?
        .as_number()
        .unwrap_or(0.0);
    let len = if len.is_finite() && len > 0.0 { len as u32 } else { 0 };
    let mut items = Vec::with_capacity(len as usize);
    for index in 0..len {
        let item = array.get(&PropertyKey::from(index), receiver)?;
        items.push(to_json(&item, stack)?.unwrap_or(Json::Null));
    }
    Ok(Json::Array(items))
}

fn object_to_json(
    obj: &dyn ObjectTarget,
    receiver: &Value,
    stack: &mut Vec<*const ()>,
) -> Result<Json> {
    let mut map = Map::new();
    for key in obj.own_keys()? {
        let PropertyKey::String(name) = &key else {
            continue;
        };
        let enumerable = obj
            .get_own_property(&key)?
            .is_some_and(|desc| desc.is_enumerable());
        if !enumerable {
            continue;
        }
        let member = obj.get(&key, receiver)?;
        if let Some(json) = to_json(&member, stack)? {
            map.insert(name.clone(), json);
        }
    }
    Ok(Json::Object(map))
}

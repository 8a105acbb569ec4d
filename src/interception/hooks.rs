// src/interception/hooks.rs
//! Before/after hooks
//!
//! Hooks are trusted extension points. A hook error aborts the operation that
//! triggered it and propagates to the caller unchanged.

use crate::host::{PropertyKey, Value};
use crate::utils::errors::Result;
use std::fmt;

/// Strategy injected into a wrapped tree
///
/// `path` is the access path of the wrapper handling the operation; for
/// property traps, `key` is the member being accessed. Every method defaults
/// to a no-op.
pub trait InterceptHooks {
    /// Runs before a property read
    fn before_get(&self, _path: &str, _key: &PropertyKey) -> Result<()> {
        Ok(())
    }

    /// Runs after a property read; `Some` supersedes the value unless it is
    /// nullish
    fn after_get(&self, _path: &str, _key: &PropertyKey, _value: &Value) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Runs before a property write; `Some` substitutes the written value
    fn before_set(&self, _path: &str, _key: &PropertyKey, _value: &Value) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Runs after a property write
    fn after_set(&self, _path: &str, _key: &PropertyKey, _value: &Value) -> Result<()> {
        Ok(())
    }

    /// Runs before an invocation; `Some` replaces the argument list
    fn before_apply(&self, _path: &str, _args: &[Value]) -> Result<Option<Vec<Value>>> {
        Ok(None)
    }

    /// Runs after an invocation; `Some` supersedes the result unless it is
    /// nullish
    fn after_apply(&self, _path: &str, _args: &[Value], _result: &Value) -> Result<Option<Value>> {
        Ok(None)
    }
}

type BeforeGetFn = dyn Fn(&str, &PropertyKey) -> Result<()>;
type ValueHookFn = dyn Fn(&str, &PropertyKey, &Value) -> Result<Option<Value>>;
type AfterSetFn = dyn Fn(&str, &PropertyKey, &Value) -> Result<()>;
type BeforeApplyFn = dyn Fn(&str, &[Value]) -> Result<Option<Vec<Value>>>;
type AfterApplyFn = dyn Fn(&str, &[Value], &Value) -> Result<Option<Value>>;

/// Closure-backed [`InterceptHooks`]
#[derive(Default)]
pub struct HookSet {
    before_get: Option<Box<BeforeGetFn>>,
    after_get: Option<Box<ValueHookFn>>,
    before_set: Option<Box<ValueHookFn>>,
    after_set: Option<Box<AfterSetFn>>,
    before_apply: Option<Box<BeforeApplyFn>>,
    after_apply: Option<Box<AfterApplyFn>>,
}

impl HookSet {
    /// Empty set; every hook is a no-op until registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hook run before each property read
    pub fn before_get<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &PropertyKey) -> Result<()> + 'static,
    {
        self.before_get = Some(Box::new(hook));
        self
    }

    /// Register the hook that may supersede a read value
    pub fn after_get<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &PropertyKey, &Value) -> Result<Option<Value>> + 'static,
    {
        self.after_get = Some(Box::new(hook));
        self
    }

    /// Register the hook that may substitute a written value
    pub fn before_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &PropertyKey, &Value) -> Result<Option<Value>> + 'static,
    {
        self.before_set = Some(Box::new(hook));
        self
    }

    /// Register the hook run after each property write
    pub fn after_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &PropertyKey, &Value) -> Result<()> + 'static,
    {
        self.after_set = Some(Box::new(hook));
        self
    }

    /// Register the hook that may replace an invocation's arguments
    pub fn before_apply<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<Option<Vec<Value>>> + 'static,
    {
        self.before_apply = Some(Box::new(hook));
        self
    }

    /// Register the hook that may supersede an invocation's result
    pub fn after_apply<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &[Value], &Value) -> Result<Option<Value>> + 'static,
    {
        self.after_apply = Some(Box::new(hook));
        self
    }
}

impl InterceptHooks for HookSet {
    fn before_get(&self, path: &str, key: &PropertyKey) -> Result<()> {
        match &self.before_get {
            Some(hook) => hook(path, key),
            None => Ok(()),
        }
    }

    fn after_get(&self, path: &str, key: &PropertyKey, value: &Value) -> Result<Option<Value>> {
        match &self.after_get {
            Some(hook) => hook(path, key, value),
            None => Ok(None),
        }
    }

    fn before_set(&self, path: &str, key: &PropertyKey, value: &Value) -> Result<Option<Value>> {
        match &self.before_set {
            Some(hook) => hook(path, key, value),
            None => Ok(None),
        }
    }

    fn after_set(&self, path: &str, key: &PropertyKey, value: &Value) -> Result<()> {
        match &self.after_set {
            Some(hook) => hook(path, key, value),
            None => Ok(()),
        }
    }

    fn before_apply(&self, path: &str, args: &[Value]) -> Result<Option<Vec<Value>>> {
        match &self.before_apply {
            Some(hook) => hook(path, args),
            None => Ok(None),
        }
    }

    fn after_apply(&self, path: &str, args: &[Value], result: &Value) -> Result<Option<Value>> {
        match &self.after_apply {
            Some(hook) => hook(path, args, result),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("before_get", &self.before_get.is_some())
            .field("after_get", &self.after_get.is_some())
            .field("before_set", &self.before_set.is_some())
            .field("after_set", &self.after_set.is_some())
            .field("before_apply", &self.before_apply.is_some())
            .field("after_apply", &self.after_apply.is_some())
            .finish()
    }
}

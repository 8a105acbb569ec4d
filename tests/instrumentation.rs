// tests/instrumentation.rs
//! End-to-end behaviour of an instrumented environment

use proptest::prelude::*;
use sentra_lab_envtrace::host::{FunctionTarget, ObjectTarget, PropertyKey};
use sentra_lab_envtrace::{
    instrument, Event, HookSet, HostError, HostObject, InstrumentOptions, LogLevel, Mode,
    NativeFunction, Operation, SerializationPolicy, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

type Lines = Rc<RefCell<Vec<String>>>;

fn line_sink(options: InstrumentOptions) -> (InstrumentOptions, Lines) {
    let lines: Lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let options = options.with_log_level(LogLevel::lines(move |line| {
        sink.borrow_mut().push(line.to_string());
        Ok(())
    }));
    (options, lines)
}

fn environment() -> Value {
    let navigator = HostObject::with_class("Navigator")
        .with_property("language", "en-US")
        .with_property("platform", "Linux x86_64")
        .with_property("userAgent", "Mozilla/5.0")
        .into_value();
    let console = HostObject::with_class("Console")
        .with_property(
            "log",
            NativeFunction::new("log", |_, _| Ok(Value::Undefined)).into_value(),
        )
        .into_value();
    let screen = HostObject::with_class("Screen")
        .with_property(
            "orientation",
            HostObject::new().with_property("type", "landscape-primary").into_value(),
        )
        .into_value();
    HostObject::with_class("Window")
        .with_property("navigator", navigator)
        .with_property("console", console)
        .with_property("screen", screen)
        .with_property(
            "addEventListener",
            NativeFunction::new("addEventListener", |_, _| Ok(Value::Undefined)).into_value(),
        )
        .into_value()
}

fn read(value: &Value, key: &str) -> Result<Value, HostError> {
    let object: &dyn ObjectTarget = match value {
        Value::Object(object) => object.as_ref(),
        Value::Function(function) => function.as_object(),
        other => panic!("not an object: {other:?}"),
    };
    object.get(&PropertyKey::from(key), value)
}

fn write(value: &Value, key: &str, new_value: Value) -> Result<bool, HostError> {
    value
        .as_object()
        .expect("object")
        .set(PropertyKey::from(key), new_value, value)
}

#[test]
fn test_path_is_access_chain() {
    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(environment(), options).unwrap();

    let navigator = read(&env, "navigator").unwrap();
    let language = read(&navigator, "language").unwrap();
    assert_eq!(language, Value::from("en-US"));

    let lines = lines.borrow();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("caller => [env.navigator] get property => [navigator], value => [{"));
    assert_eq!(
        lines[1],
        "caller => [env.navigator.language] get property => [language], value => [en-US]"
    );
}

#[test]
fn test_wrapping_is_transitive() {
    let raw = environment();
    let raw_screen = read(&raw, "screen").unwrap();
    let raw_orientation = read(&raw_screen, "orientation").unwrap();

    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(raw, options).unwrap();
    let screen = read(&env, "screen").unwrap();
    let orientation = read(&screen, "orientation").unwrap();

    assert!(!screen.same_value(&raw_screen));
    assert!(!orientation.same_value(&raw_orientation));

    // Still wrapped two levels down: the read is observed.
    let kind = read(&orientation, "type").unwrap();
    assert_eq!(kind, Value::from("landscape-primary"));
    assert!(lines
        .borrow()
        .last()
        .unwrap()
        .starts_with("caller => [env.screen.orientation.type]"));
}

#[test]
fn test_reads_return_equivalent_wrappers() {
    let (options, _lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(environment(), options).unwrap();

    let first = read(&env, "navigator").unwrap();
    let second = read(&env, "navigator").unwrap();
    // Identity is not preserved across reads; behaviour is.
    assert!(!first.same_value(&second));
    assert_eq!(
        read(&first, "platform").unwrap(),
        read(&second, "platform").unwrap()
    );
}

#[test]
fn test_write_then_read_round_trip() {
    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(environment(), options).unwrap();

    assert!(write(&env, "name", Value::from("renamed")).unwrap());
    assert_eq!(read(&env, "name").unwrap(), Value::from("renamed"));
    assert_eq!(
        lines.borrow()[0],
        "caller => [env.name] set property => [name], value => [renamed]"
    );
}

#[test]
fn test_unwatched_properties_bypass() {
    let (options, lines) = line_sink(InstrumentOptions::new("env").watch(["userAgent"]));
    let navigator = HostObject::with_class("Navigator")
        .with_property("platform", "Linux x86_64")
        .with_property("userAgent", "Mozilla/5.0")
        .into_value();
    let navigator = instrument(navigator, options).unwrap();

    assert_eq!(read(&navigator, "platform").unwrap(), Value::from("Linux x86_64"));
    assert!(lines.borrow().is_empty());

    assert_eq!(read(&navigator, "userAgent").unwrap(), Value::from("Mozilla/5.0"));
    assert_eq!(lines.borrow().len(), 1);
}

#[test]
fn test_unwatched_objects_are_not_wrapped() {
    let raw = environment();
    let raw_screen = read(&raw, "screen").unwrap();
    let (options, _lines) = line_sink(InstrumentOptions::new("env").watch(["navigator"]));
    let env = instrument(raw, options).unwrap();

    assert!(read(&env, "screen").unwrap().same_value(&raw_screen));
}

#[test]
fn test_event_registration_is_condensed() {
    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(environment(), options).unwrap();

    let add = read(&env, "addEventListener").unwrap();
    let listener = NativeFunction::new("onClick", |_, _| Ok(Value::Undefined)).into_value();
    add.as_function()
        .unwrap()
        .call(env.clone(), vec![Value::from("click"), listener])
        .unwrap();

    let lines = lines.borrow();
    let invoke = lines.last().unwrap();
    assert_eq!(
        invoke,
        "caller => [env.addEventListener] call function => [click], result => [undefined]"
    );
    assert!(!invoke.contains("onClick"));
}

#[test]
fn test_circular_value_fails_the_read() {
    let node = HostObject::new().into_ref();
    node.set(
        PropertyKey::from("self"),
        Value::Object(Rc::clone(&node)),
        &Value::Undefined,
    )
    .unwrap();
    let root = HostObject::new().with_property("node", Value::Object(node)).into_value();

    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(root, options).unwrap();
    let err = read(&env, "node").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: Converting circular structure to JSON");
    assert!(lines.borrow().is_empty());
}

#[test]
fn test_annotate_policy_keeps_reading() {
    let root = HostObject::new()
        .with_property("big", HostObject::new().with_property("n", Value::BigInt(9)).into_value())
        .into_value();
    let (options, lines) = line_sink(
        InstrumentOptions::new("env").with_serialization_policy(SerializationPolicy::Annotate),
    );
    let env = instrument(root, options).unwrap();

    let big = read(&env, "big").unwrap();
    assert!(big.is_object());
    assert!(lines.borrow()[0]
        .ends_with("value => [<unserializable: TypeError: Do not know how to serialize a BigInt>]"));
}

#[test]
fn test_self_assignment_fails_like_a_cycle() {
    let root = HostObject::with_class("Window").with_property("name", "w").into_value();
    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(root, options).unwrap();

    let err = write(&env, "copy", env.clone()).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: Converting circular structure to JSON");
    assert!(lines.borrow().is_empty());

    // The environment stays usable afterwards.
    assert_eq!(read(&env, "name").unwrap(), Value::from("w"));
}

#[test]
fn test_self_assignment_under_annotate() {
    let root = HostObject::with_class("Window").with_property("name", "w").into_value();
    let (options, lines) = line_sink(
        InstrumentOptions::new("env").with_serialization_policy(SerializationPolicy::Annotate),
    );
    let env = instrument(root, options).unwrap();

    assert!(write(&env, "copy", env.clone()).unwrap());
    let copy = read(&env, "copy").unwrap();
    assert!(copy.is_object());
    assert_eq!(read(&copy, "name").unwrap(), Value::from("w"));

    let lines = lines.borrow();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(
        "value => [<unserializable: TypeError: Converting circular structure to JSON>]"
    ));
    assert!(lines[1].starts_with("caller => [env.copy] get property => [copy]"));
    assert_eq!(
        lines[2],
        "caller => [env.copy.name] get property => [name], value => [w]"
    );
}

#[test]
fn test_exempt_subtree_is_silent() {
    let (options, lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(environment(), options).unwrap();

    let console = read(&env, "console").unwrap();
    let log = read(&console, "log").unwrap();
    log.as_function()
        .unwrap()
        .call(console.clone(), vec![Value::from("hello")])
        .unwrap();
    assert!(lines.borrow().is_empty());
}

#[test]
fn test_hooks_see_paths_and_substitute() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let hooks = HookSet::new()
        .before_get(move |path, key| {
            record.borrow_mut().push(format!("{path}.{key}"));
            Ok(())
        })
        .after_get(|_, key, _| {
            Ok((key.as_str() == Some("userAgent")).then(|| Value::from("Spoofed/1.0")))
        });
    let (options, _lines) = line_sink(InstrumentOptions::new("env").with_hooks(hooks));
    let env = instrument(environment(), options).unwrap();

    let navigator = read(&env, "navigator").unwrap();
    assert_eq!(read(&navigator, "userAgent").unwrap(), Value::from("Spoofed/1.0"));
    assert_eq!(read(&navigator, "platform").unwrap(), Value::from("Linux x86_64"));
    assert_eq!(
        seen.borrow().as_slice(),
        ["env.navigator", "env.navigator.userAgent", "env.navigator.platform"]
    );
}

#[test]
fn test_reentrant_hook_reads() {
    // A hook that reads through the wrapped tree while a trap is running.
    let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    let hooks = HookSet::new().before_get(move |path, key| {
        if path == "env" && key.as_str() == Some("screen") {
            if let Some(env) = inner.borrow().as_ref() {
                read(env, "navigator")?;
            }
        }
        Ok(())
    });
    let (options, lines) = line_sink(InstrumentOptions::new("env").with_hooks(hooks));
    let env = instrument(environment(), options).unwrap();
    *slot.borrow_mut() = Some(env.clone());

    read(&env, "screen").unwrap();
    let lines = lines.borrow();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("caller => [env.navigator]"));
    assert!(lines[1].starts_with("caller => [env.screen]"));
}

#[test]
fn test_hook_failure_aborts_operation() {
    let hooks = HookSet::new().before_set(|_, _, _| Err(HostError::Thrown(Value::from("denied"))));
    let raw = environment();
    let (options, lines) = line_sink(InstrumentOptions::new("env").with_hooks(hooks));
    let env = instrument(raw.clone(), options).unwrap();

    let err = write(&env, "name", Value::from("renamed")).unwrap_err();
    assert_eq!(err.to_string(), "Uncaught denied");
    assert_eq!(read(&raw, "name").unwrap(), Value::Undefined);
    assert!(lines.borrow().is_empty());
}

#[test]
fn test_receiver_binding() {
    let tag = NativeFunction::new("tag", |this, _| Ok(Value::from(this.type_name()))).into_value();
    let root = HostObject::new().with_property("tag", tag).into_value();

    for (bind, expected) in [(false, "object"), (true, "function")] {
        let (options, _lines) =
            line_sink(InstrumentOptions::new("env").bind_receiver_to_target(bind));
        let env = instrument(root.clone(), options).unwrap();
        let func = read(&env, "tag").unwrap();
        let result = func
            .as_function()
            .unwrap()
            .call(env.clone(), Vec::new())
            .unwrap();
        assert_eq!(result, Value::from(expected));
    }
}

#[test]
fn test_method_mode_root() {
    let fetch = NativeFunction::new("fetch", |_, args| {
        Ok(HostObject::with_class("Response")
            .with_property("url", args.first().cloned().unwrap_or_default())
            .into_value())
    })
    .into_value();
    let (options, lines) = line_sink(InstrumentOptions::new("fetch").with_mode(Mode::Method));
    let fetch = instrument(fetch, options).unwrap();

    let response = fetch
        .as_function()
        .unwrap()
        .call(Value::Undefined, vec![Value::from("/api")])
        .unwrap();
    assert_eq!(read(&response, "url").unwrap(), Value::from("/api"));

    let lines = lines.borrow();
    assert_eq!(
        lines[0],
        "caller => [fetch] call function => [[\"/api\"]], result => [{\"url\":\"/api\"}]"
    );
    assert_eq!(
        lines[1],
        "caller => [fetch.url] get property => [url], value => [/api]"
    );
}

#[test]
fn test_structured_sink_and_failure() {
    let events = Rc::new(RefCell::new(Vec::<Event>::new()));
    let sink = Rc::clone(&events);
    let options = InstrumentOptions::new("env").with_log_level(LogLevel::events(move |event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    }));
    let env = instrument(environment(), options).unwrap();
    let navigator = read(&env, "navigator").unwrap();
    navigator
        .as_object()
        .unwrap()
        .has(&PropertyKey::from("language"))
        .unwrap();

    let events = events.borrow();
    assert_eq!(events[1].operation, Operation::HasProperty);
    assert_eq!(events[1].actor, "env.navigator.language");
    assert_eq!(events[1].subject.as_deref(), Some("language"));

    let failing = InstrumentOptions::new("env")
        .with_log_level(LogLevel::lines(|_| Err(HostError::type_error("sink unavailable"))));
    let env = instrument(environment(), failing).unwrap();
    assert_eq!(
        read(&env, "navigator").unwrap_err().to_string(),
        "TypeError: sink unavailable"
    );
}

#[test]
fn test_host_errors_surface_unchanged() {
    let frozen = HostObject::new().into_ref();
    frozen.prevent_extensions().unwrap();
    let root = HostObject::new()
        .with_property("frozen", Value::Object(frozen))
        .into_value();
    let (options, _lines) = line_sink(InstrumentOptions::new("env"));
    let env = instrument(root, options).unwrap();

    let frozen = read(&env, "frozen").unwrap();
    let raw_proto = HostObject::new().into_value();
    let err = frozen
        .as_object()
        .unwrap()
        .set_prototype_of(Value::from(3));
    assert!(matches!(err, Err(HostError::TypeError(_))));
    assert!(!frozen
        .as_object()
        .unwrap()
        .set_prototype_of(raw_proto)
        .unwrap());
}

proptest! {
    #[test]
    fn prop_member_path_joins_keys(root in "[a-z]{1,8}", keys in prop::collection::vec("[a-zA-Z]{1,8}", 1..5)) {
        let mut raw = HostObject::new().with_property("leaf", 1);
        for key in keys.iter().rev() {
            raw = HostObject::new().with_property(key.as_str(), raw.into_value());
        }
        let mut options = InstrumentOptions::new(root.clone());
        options.exempt_subtrees.clear();
        let (options, lines) = line_sink(options);
        let mut current = instrument(raw.into_value(), options).unwrap();
        for key in &keys {
            current = read(&current, key).unwrap();
        }
        read(&current, "leaf").unwrap();

        let expected = format!("{}.{}.leaf", root, keys.join("."));
        let lines = lines.borrow();
        let last = lines.last().unwrap();
        prop_assert!(last.starts_with(&format!("caller => [{expected}]")), "{}", last);
    }

    #[test]
    fn prop_write_read_round_trip(key in "[a-z]{1,12}", n in any::<i32>(), text in ".{0,16}") {
        let (options, _lines) = line_sink(InstrumentOptions::new("env"));
        let env = instrument(HostObject::new().into_value(), options).unwrap();

        write(&env, &key, Value::from(n)).unwrap();
        prop_assert_eq!(read(&env, &key).unwrap(), Value::from(n));
        write(&env, &key, Value::from(text.as_str())).unwrap();
        prop_assert_eq!(read(&env, &key).unwrap(), Value::from(text.as_str()));
    }

    #[test]
    fn prop_unwatched_reads_are_silent(key in "[a-z]{1,12}") {
        prop_assume!(key != "useragent");
        let (options, lines) = line_sink(InstrumentOptions::new("env").watch(["useragent"]));
        let raw = HostObject::new().with_property(key.as_str(), 7).into_value();
        let env = instrument(raw, options).unwrap();

        prop_assert_eq!(read(&env, &key).unwrap(), Value::from(7));
        prop_assert!(lines.borrow().is_empty());
    }
}

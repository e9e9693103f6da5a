//! Unit tests for controller declarations.

use std::cell::Cell;
use std::rc::Rc;

use rstest::rstest;

use super::*;
use crate::value::Outcome;

#[derive(Default)]
struct Counter {
    seen_debug: bool,
}

impl Counter {
    fn bump(&mut self, args: CallArgs) -> CommandResult {
        let [step] = args.into_array()?;
        Ok(Outcome::Message(format!(
            "{}:{}",
            step.into_text().unwrap_or_default(),
            self.seen_debug
        )))
    }

    fn version(args: CallArgs) -> CommandResult {
        let [] = args.into_array()?;
        Ok(Outcome::Message(String::from("1.0")))
    }
}

impl Controller for Counter {
    const PLUGIN_NAME: &'static str = "counter";

    fn help() -> Option<&'static str> {
        Some("Count things.")
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("bump", Self::bump)
                .cli()
                .doc("Bump.\n---\nArgs:\n  step: How far.")
                .param(Param::new("step"))
                .aliases(["b"]),
            Method::new_static("version", Self::version),
        ]
    }

    fn attach(&mut self, namespace: &Namespace) {
        self.seen_debug = namespace.debug();
    }
}

#[test]
fn class_captures_declared_metadata() {
    let class = ControllerClass::of::<Counter>();
    assert_eq!(class.name(), "counter");
    assert_eq!(class.help(), Some("Count things."));
    assert!(class.type_name().ends_with("Counter"));

    let names: Vec<_> = class.methods().iter().map(MethodSpec::name).collect();
    assert_eq!(names, ["bump", "version"]);
}

#[rstest]
#[case::bound("bump", true, false)]
#[case::static_helper("version", false, true)]
fn method_spec_flags(#[case] name: &str, #[case] cli: bool, #[case] is_static: bool) {
    let class = ControllerClass::of::<Counter>();
    let spec = class
        .methods()
        .iter()
        .find(|method| method.name() == name)
        .expect("method declared");
    assert_eq!(spec.is_cli_enabled(), cli);
    assert_eq!(spec.is_static(), is_static);
    assert!(spec.qualified_name().ends_with(&format!("Counter::{name}")));
}

#[test]
fn invoke_attaches_namespace_before_calling() {
    let class = ControllerClass::of::<Counter>();
    let namespace = Namespace::new("counter", "bump").with_debug(true);
    let outcome = class
        .invoke("bump", &namespace, CallArgs::new(vec![ArgValue::text("3")]))
        .expect("method exists")
        .expect("method succeeds");
    assert_eq!(outcome, Outcome::Message(String::from("3:true")));
}

#[test]
fn invoke_constructs_a_fresh_instance_per_call() {
    let built = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&built);
    let class = ControllerClass::new(move || {
        counter.set(counter.get() + 1);
        Ok(Counter::default())
    });
    let namespace = Namespace::new("counter", "version");
    for _ in 0..2 {
        let result = class
            .invoke("version", &namespace, CallArgs::default())
            .expect("method exists");
        assert!(result.is_ok());
    }
    assert_eq!(built.get(), 2);
}

#[test]
fn factory_failure_is_returned_as_command_error() {
    let class = ControllerClass::new(|| -> Result<Counter, CommandError> {
        Err(CommandError::exit("cannot build"))
    });
    let result = class
        .invoke("version", &Namespace::new("counter", "version"), CallArgs::default())
        .expect("method exists");
    let error = result.expect_err("factory failure surfaces");
    assert_eq!(error.to_string(), "cannot build");
}

#[test]
fn invoke_rejects_undeclared_method() {
    let class = ControllerClass::of::<Counter>();
    let error = class
        .invoke("missing", &Namespace::new("counter", "missing"), CallArgs::default())
        .expect_err("method is not declared");
    assert!(matches!(error, DispatchError::UnknownMethod { .. }));
}

#[test]
fn arity_mismatch_is_reported() {
    let class = ControllerClass::of::<Counter>();
    let result = class
        .invoke("bump", &Namespace::new("counter", "bump"), CallArgs::default())
        .expect("method exists");
    assert!(matches!(
        result,
        Err(CommandError::Arity {
            expected: 1,
            actual: 0
        })
    ));
}

#[rstest]
#[case::required(Param::new("name"), None)]
#[case::optional(Param::optional("color"), Some(ArgValue::Unset))]
#[case::toggle(Param::toggle("local", false), Some(ArgValue::Bool(false)))]
#[case::text(Param::new("method").default("run"), Some(ArgValue::text("run")))]
fn param_defaults(#[case] param: Param, #[case] expected: Option<ArgValue>) {
    assert_eq!(param.default_value(), expected.as_ref());
}

#[test]
fn fallbacks_are_recorded_as_a_table() {
    let method: Method<Counter> = Method::new("bump", Counter::bump)
        .param(Param::new("step"))
        .fallbacks([("step", "1")]);
    let table = method.spec().fallbacks().expect("table declared");
    assert_eq!(table.get("step"), Some(&ArgValue::text("1")));
}

//! Behaviour-driven tests for registration and dispatch.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use super::Deploy;
use crate::{
    CallArgs, CommandError, CommandResult, Controller, ControllerClass, DefaultTarget,
    DispatchError, Dispatcher, Method, Outcome, Param, RegistrationError,
};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    dispatcher: Option<Dispatcher>,
    result: Option<Result<CommandResult, DispatchError>>,
    registration: Option<Result<(), RegistrationError>>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Controllers that fail registration
// ---------------------------------------------------------------------------

fn accept(args: CallArgs) -> CommandResult {
    drop(args);
    Ok(Outcome::Done)
}

#[derive(Default)]
struct Sloppy;

impl Controller for Sloppy {
    const PLUGIN_NAME: &'static str = "sloppy";

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new_static("greet", accept)
                .cli()
                .doc("Greet.\n---\nArgs:\n  name: Who.")
                .param(Param::new("name"))
                .param(Param::new("age")),
        ]
    }
}

#[derive(Default)]
struct Greeter;

impl Controller for Greeter {
    const PLUGIN_NAME: &'static str = "greeter";

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new_static("wave", accept)
                .cli()
                .doc("Wave.")
                .aliases(["hello"]),
        ]
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dispatcher(world: &mut TestWorld) -> &mut Dispatcher {
    world
        .dispatcher
        .as_mut()
        .expect("dispatcher configured by a Given step")
}

fn run(world: &mut TestWorld, tokens: &[&str]) {
    let args: Vec<&str> = std::iter::once("fractal").chain(tokens.iter().copied()).collect();
    let result = dispatcher(world).dispatch(args);
    world.result = Some(result);
}

fn data(world: &TestWorld) -> &Value {
    match world.result.as_ref().expect("command ran") {
        Ok(Ok(Outcome::Data(value))) => value,
        other => panic!("expected data, got {other:?}"),
    }
}

fn register(world: &mut TestWorld, class: ControllerClass) {
    let outcome = dispatcher(world).register(class).map(|_| ());
    world.registration = Some(outcome);
}

fn registration_error(world: &TestWorld) -> &RegistrationError {
    world
        .registration
        .as_ref()
        .expect("registration attempted")
        .as_ref()
        .expect_err("expected registration to fail")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("the deploy controller is registered")]
fn given_deploy(world: &mut TestWorld) {
    let mut dispatcher = Dispatcher::new("fractal");
    dispatcher
        .register(ControllerClass::of::<Deploy>())
        .expect("deploy registers");
    world.dispatcher = Some(dispatcher);
}

#[given("the default controller is {name}")]
fn given_default(world: &mut TestWorld, name: String) {
    let target = DefaultTarget::controller(name.trim_matches('"'));
    world.dispatcher = world
        .dispatcher
        .take()
        .map(|dispatcher| dispatcher.with_default_target(Some(target)));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the command line is {line}")]
fn when_command_line(world: &mut TestWorld, line: String) {
    let text = line.trim_matches('"').to_owned();
    let tokens: Vec<&str> = text.split_whitespace().collect();
    run(world, &tokens);
}

#[when("the program runs without arguments")]
fn when_bare(world: &mut TestWorld) {
    run(world, &[]);
}

#[when("a controller with an undocumented argument is registered")]
fn when_register_sloppy(world: &mut TestWorld) {
    register(world, ControllerClass::of::<Sloppy>());
}

#[when("a controller claiming the alias {alias} is registered")]
fn when_register_greeter(world: &mut TestWorld, alias: String) {
    assert_eq!(alias.trim_matches('"'), "hello", "Greeter claims 'hello'");
    register(world, ControllerClass::of::<Greeter>());
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the command succeeds")]
fn then_succeeds(world: &mut TestWorld) {
    let result = world.result.as_ref().expect("command ran");
    assert!(
        matches!(result, Ok(Ok(_))),
        "expected success, got {result:?}"
    );
}

#[then("argument {name} is {value}")]
fn then_argument(world: &mut TestWorld, name: String, value: String) {
    let key = name.trim_matches('"');
    let expected = value.trim_matches('"');
    assert_eq!(data(world).get(key), Some(&Value::from(expected)));
}

#[then("argument {name} was not given")]
fn then_argument_unset(world: &mut TestWorld, name: String) {
    let key = name.trim_matches('"');
    assert_eq!(data(world).get(key), Some(&Value::Null));
}

#[then("help is displayed")]
fn then_help(world: &mut TestWorld) {
    match world.result.as_ref().expect("command ran") {
        Err(DispatchError::Usage(error)) => {
            assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
        }
        other => panic!("expected help, got {other:?}"),
    }
}

#[then("the command fails with status {status}")]
fn then_fails(world: &mut TestWorld, status: u8) {
    match world.result.as_ref().expect("command ran") {
        Ok(Err(error @ CommandError::Exit { .. })) => assert_eq!(error.status(), status),
        other => panic!("expected an exit error, got {other:?}"),
    }
}

#[then("registration fails because {name} is undocumented")]
fn then_undocumented(world: &mut TestWorld, name: String) {
    let expected = name.trim_matches('"');
    match registration_error(world) {
        RegistrationError::UndocumentedArgument { missing, .. } => {
            assert_eq!(missing, &[expected.to_owned()]);
        }
        other => panic!("expected an undocumented argument, got {other:?}"),
    }
}

#[then("registration fails with a duplicate alias")]
fn then_duplicate(world: &mut TestWorld) {
    let error = registration_error(world);
    assert!(
        matches!(error, RegistrationError::DuplicateAlias { .. }),
        "expected a duplicate alias, got {error:?}"
    );
}

#[then("the alias {alias} still belongs to {plugin}")]
fn then_alias_owner(world: &mut TestWorld, alias: String, plugin: String) {
    let registry = dispatcher(world).registry();
    let entry = registry
        .aliases()
        .resolve(alias.trim_matches('"'))
        .expect("alias registered");
    assert_eq!(entry.plugin(), plugin.trim_matches('"'));
    assert!(registry.get("greeter").is_none());
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Alias invocation reaches the aliased method"
)]
fn alias_invocation(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Canonical invocation matches the alias form"
)]
fn canonical_invocation(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Leading flags go to the default controller"
)]
fn default_controller(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Bare invocation shows help without a default controller"
)]
fn bare_invocation(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Command failures are returned unchanged"
)]
fn command_failures(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Undocumented arguments are rejected at registration"
)]
fn undocumented_arguments(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Duplicate aliases are rejected at registration"
)]
fn duplicate_aliases(world: TestWorld) {
    let _ = world;
}

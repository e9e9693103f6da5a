//! Unit tests for the controller registry.

use rstest::{fixture, rstest};

use super::*;
use crate::controller::{Controller, Method, Param};
use crate::value::{CallArgs, CommandResult, Outcome};

fn done(args: CallArgs) -> CommandResult {
    drop(args);
    Ok(Outcome::Done)
}

#[derive(Default)]
struct Auth;

impl Auth {
    fn login(&mut self, args: CallArgs) -> CommandResult {
        done(args)
    }
}

impl Controller for Auth {
    const PLUGIN_NAME: &'static str = "auth";

    fn help() -> Option<&'static str> {
        Some("  Manage your session.  ")
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("login", Self::login)
                .cli()
                .doc("Log in.\n---\nArgs:\n  matrix_id: Who.")
                .param(Param::optional("matrix_id"))
                .aliases(["login"]),
            Method::new("refresh_token", Self::login),
        ]
    }
}

#[derive(Default)]
struct Session;

impl Controller for Session {
    const PLUGIN_NAME: &'static str = "session";

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new_static("open", done)
                .cli()
                .doc("Open.")
                .aliases(["login"]),
        ]
    }
}

#[derive(Default)]
struct Nameless;

impl Controller for Nameless {
    const PLUGIN_NAME: &'static str = "  ";

    fn methods() -> Vec<Method<Self>> {
        Vec::new()
    }
}

#[derive(Default)]
struct Undocumented;

impl Controller for Undocumented {
    const PLUGIN_NAME: &'static str = "broken";

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new_static("ok", done).cli().doc("Fine.").aliases(["ok"]),
            Method::new_static("bad", done).cli().param(Param::new("x")),
        ]
    }
}

#[derive(Default)]
struct Shadow;

impl Controller for Shadow {
    const PLUGIN_NAME: &'static str = "shadow";

    fn methods() -> Vec<Method<Self>> {
        vec![Method::new_static("grab", done).cli().doc("Grab.").aliases(["auth"])]
    }
}

#[fixture]
fn registry() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry
        .register(ControllerClass::of::<Auth>())
        .expect("auth registers");
    registry
}

#[rstest]
fn registration_records_descriptors(registry: ControllerRegistry) {
    let plugin = registry.get("auth").expect("auth registered");
    assert_eq!(plugin.help(), Some("Manage your session."));
    let names: Vec<&str> = plugin.methods().iter().map(MethodDescriptor::name).collect();
    assert_eq!(names, ["login"]);
    assert!(registry.aliases().contains("login"));
    assert_eq!(registry.len(), 1);
}

#[rstest]
fn resolve_finds_cli_methods(registry: ControllerRegistry) {
    let (plugin, method) = registry.resolve("auth", "login").expect("resolves");
    assert_eq!(plugin.name(), "auth");
    assert_eq!(method.name(), "login");
}

#[rstest]
#[case::unknown_plugin("nope", "login")]
#[case::unknown_method("auth", "nope")]
#[case::not_cli("auth", "refresh_token")]
#[case::not_cli_dashed("auth", "refresh-token")]
fn resolve_failures(registry: ControllerRegistry, #[case] plugin: &str, #[case] method: &str) {
    let error = registry
        .resolve(plugin, method)
        .expect_err("resolution fails");
    match plugin {
        "nope" => assert!(matches!(error, DispatchError::UnknownController { .. })),
        _ if method == "nope" => assert!(matches!(error, DispatchError::UnknownMethod { .. })),
        _ => assert!(
            matches!(
                &error,
                DispatchError::MethodNotCliEnabled { method: qualified }
                    if qualified.ends_with("Auth::refresh_token")
            ),
            "unexpected error: {error:?}"
        ),
    }
}

#[rstest]
fn clashing_alias_leaves_registry_unchanged(mut registry: ControllerRegistry) {
    let error = registry
        .register(ControllerClass::of::<Session>())
        .expect_err("login alias is taken");
    assert!(matches!(error, RegistrationError::DuplicateAlias { .. }));
    assert!(registry.get("session").is_none());
    assert_eq!(
        registry.aliases().resolve("login").map(|entry| entry.plugin()),
        Some("auth")
    );
}

#[rstest]
fn alias_may_not_shadow_a_controller(mut registry: ControllerRegistry) {
    let error = registry
        .register(ControllerClass::of::<Shadow>())
        .expect_err("auth is a controller");
    assert_eq!(
        error,
        RegistrationError::DuplicateAlias {
            alias: String::from("auth"),
            owner: String::from("auth"),
        }
    );
}

#[test]
fn blank_plugin_name_is_rejected() {
    let mut registry = ControllerRegistry::new();
    let error = registry
        .register(ControllerClass::of::<Nameless>())
        .expect_err("name required");
    assert!(matches!(error, RegistrationError::MissingPluginName { .. }));
}

#[test]
fn invalid_method_aborts_whole_registration() {
    let mut registry = ControllerRegistry::new();
    let error = registry
        .register(ControllerClass::of::<Undocumented>())
        .expect_err("bad is undocumented");
    assert!(matches!(error, RegistrationError::MissingDocstring { .. }));
    assert!(registry.is_empty());
    assert!(registry.aliases().is_empty());
}

#[rstest]
fn re_registration_replaces_and_releases_aliases(mut registry: ControllerRegistry) {
    registry
        .register(ControllerClass::of::<Auth>())
        .expect("re-registering the same controller succeeds");
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.aliases().len(), 1);
}

#[rstest]
fn root_command_lists_plugins_and_aliases(registry: ControllerRegistry) {
    let command = registry.command("fractal", Some("Fractal Networks"));
    let names: Vec<&str> = command.get_subcommands().map(Command::get_name).collect();
    assert_eq!(names, ["auth", "login"]);
    let debug = command
        .get_arguments()
        .find(|arg| arg.get_id() == DEBUG_ARG)
        .expect("debug toggle present");
    assert_eq!(debug.get_short(), Some('d'));
    assert_eq!(debug.get_long(), Some("debug"));
    assert!(!debug.is_global_set(), "toggle stays on the root command");
}

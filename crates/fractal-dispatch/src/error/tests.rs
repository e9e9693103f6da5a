//! Unit tests for dispatch error types.

use rstest::rstest;

use super::*;

#[test]
fn undocumented_argument_lists_every_missing_name() {
    let error = RegistrationError::UndocumentedArgument {
        method: "tests::Deploy::say_hello".into(),
        missing: vec!["age".into(), "color".into()],
    };
    let message = error.to_string();
    assert!(
        message.contains("age, color"),
        "expected both names in message: {message}"
    );
    assert!(
        message.contains("tests::Deploy::say_hello"),
        "expected qualified method in message: {message}"
    );
}

#[rstest]
#[case::missing_doc(
    RegistrationError::MissingDocstring { method: "m::C::run".into() },
    "m::C::run"
)]
#[case::missing_args(
    RegistrationError::MissingArgsSection { method: "m::C::run".into() },
    "'Args'"
)]
#[case::malformed(
    RegistrationError::MalformedDocumentation {
        method: "m::C::run".into(),
        message: "unexpected end".into(),
    },
    "unexpected end"
)]
#[case::invalid_description(
    RegistrationError::InvalidArgDescription {
        method: "m::C::run".into(),
        argument: "age".into(),
    },
    "'age'"
)]
#[case::duplicate_alias(
    RegistrationError::DuplicateAlias {
        alias: "login".into(),
        owner: "auth.login".into(),
    },
    "auth.login"
)]
#[case::missing_plugin_name(
    RegistrationError::MissingPluginName { controller: "m::C".into() },
    "m::C"
)]
fn registration_errors_name_their_subject(
    #[case] error: RegistrationError,
    #[case] expected: &str,
) {
    let message = error.to_string();
    assert!(
        message.contains(expected),
        "expected '{expected}' in message: {message}"
    );
}

#[rstest]
#[case::unknown_controller(
    DispatchError::UnknownController { plugin: "nope".into() },
    "'nope'"
)]
#[case::unknown_method(
    DispatchError::UnknownMethod { plugin: "auth".into(), method: "nope".into() },
    "'nope'"
)]
#[case::not_cli(
    DispatchError::MethodNotCliEnabled { method: "m::C::helper".into() },
    "not available from the command line"
)]
fn dispatch_errors_name_their_subject(#[case] error: DispatchError, #[case] expected: &str) {
    let message = error.to_string();
    assert!(
        message.contains(expected),
        "expected '{expected}' in message: {message}"
    );
}

#[test]
fn exit_error_renders_message_verbatim() {
    let error = CommandError::exit("You are not logged in.");
    assert_eq!(error.to_string(), "You are not logged in.");
    assert_eq!(error.status(), 1);
}

#[rstest]
#[case::explicit(CommandError::Exit { status: 3, message: String::new() }, 3)]
#[case::arity(CommandError::Arity { expected: 2, actual: 1 }, 1)]
#[case::failed(CommandError::Failed(anyhow::anyhow!("boom")), 1)]
fn command_error_status(#[case] error: CommandError, #[case] expected: u8) {
    assert_eq!(error.status(), expected);
}

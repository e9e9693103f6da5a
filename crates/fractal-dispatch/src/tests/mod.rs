//! Crate-level tests and the controllers they share.

mod behaviour;

use rstest::fixture;
use serde_json::json;

use crate::{
    CallArgs, CommandError, CommandResult, Controller, ControllerClass, DefaultTarget, Dispatcher,
    Method, Namespace, Outcome, Param,
};

/// Test controller exercising every argument shape.
#[derive(Default)]
pub(crate) struct Deploy {
    debug: bool,
}

impl Deploy {
    fn say_hello(&mut self, args: CallArgs) -> CommandResult {
        let [name, age, color] = args.into_array()?;
        Ok(Outcome::Data(json!({
            "name": name,
            "age": age,
            "color": color,
            "debug": self.debug,
        })))
    }

    fn run(&mut self, args: CallArgs) -> CommandResult {
        let [target] = args.into_array()?;
        Ok(Outcome::Data(json!({ "method": "run", "target": target })))
    }

    fn ship(&mut self, args: CallArgs) -> CommandResult {
        let [dry_run] = args.into_array()?;
        Ok(Outcome::Data(json!({ "dry_run": dry_run })))
    }

    fn fail(&mut self, args: CallArgs) -> CommandResult {
        let [] = args.into_array()?;
        Err(CommandError::Exit {
            status: 3,
            message: String::from("deployment failed"),
        })
    }

    fn teardown(&mut self, args: CallArgs) -> CommandResult {
        drop(args);
        Ok(Outcome::Done)
    }

    fn version(args: CallArgs) -> CommandResult {
        let [] = args.into_array()?;
        Ok(Outcome::Message(String::from("1.2.3")))
    }
}

impl Controller for Deploy {
    const PLUGIN_NAME: &'static str = "deploy";

    fn help() -> Option<&'static str> {
        Some("Deploy things.")
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("say_hello", Self::say_hello)
                .cli()
                .doc(
                    "Say hello.
                    ---
                    Args:
                        name: Who to greet.
                        age: How old they are.
                        color: Favourite colour.",
                )
                .param(Param::new("name"))
                .param(Param::new("age"))
                .param(Param::optional("color"))
                .aliases(["hello", "hi"]),
            Method::new("run", Self::run)
                .cli()
                .doc("Deploy.\n---\nArgs:\n  target: Environment to deploy to.")
                .param(Param::new("target").default("staging")),
            Method::new("ship", Self::ship)
                .cli()
                .doc("Ship.\n---\nArgs:\n  dry_run: Only pretend.")
                .param(Param::toggle("dry_run", false)),
            Method::new("fail", Self::fail).cli().doc("Always fails."),
            Method::new("teardown", Self::teardown),
            Method::new_static("version", Self::version)
                .cli()
                .doc("Print the version."),
        ]
    }

    fn attach(&mut self, namespace: &Namespace) {
        self.debug = namespace.debug();
    }
}

#[fixture]
pub(crate) fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new("fractal");
    dispatcher
        .register(ControllerClass::of::<Deploy>())
        .expect("deploy registers");
    dispatcher
}

#[fixture]
pub(crate) fn defaulted() -> Dispatcher {
    let mut dispatcher =
        Dispatcher::new("fractal").with_default_target(Some(DefaultTarget::controller("deploy")));
    dispatcher
        .register(ControllerClass::of::<Deploy>())
        .expect("deploy registers");
    dispatcher
}

//! Controller registration and command dispatch for the Fractal CLI.
//!
//! Controllers group related commands under a plugin name (`auth`,
//! `registration`, ...). Each controller declares its method table
//! explicitly; registration turns every CLI-enabled method into a
//! [`MethodDescriptor`] by reading the parameter list and the structured
//! documentation attached to the method, and synthesises a two-level `clap`
//! parser (`<program> <plugin> <command> ...`) plus top-level shortcuts for
//! methods that declare aliases.
//!
//! A [`Dispatcher`] routes exactly one invocation: it rewrites alias and
//! default-controller shortcuts into the canonical form, parses the result,
//! resolves the controller and method, constructs the controller, and calls
//! the method with its arguments projected into declaration order.
//!
//! # Documentation format
//!
//! ```text
//! Login to a Matrix homeserver.
//! ---
//! Args:
//!     matrix_id: Matrix ID of user to login as
//!     homeserver_url: Homeserver to login to
//! ```
//!
//! The text before the `---` line is the command's help. The remainder is a
//! YAML document whose `Args` mapping documents every parameter.
//!
//! # Example
//!
//! ```
//! use fractal_dispatch::{
//!     CallArgs, CommandResult, Controller, ControllerClass, Dispatcher, Method, Outcome, Param,
//! };
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Greeter {
//!     fn hello(&mut self, args: CallArgs) -> CommandResult {
//!         let [name] = args.into_array()?;
//!         Ok(Outcome::Message(format!("hello {}", name.into_text().unwrap_or_default())))
//!     }
//! }
//!
//! impl Controller for Greeter {
//!     const PLUGIN_NAME: &'static str = "greet";
//!
//!     fn methods() -> Vec<Method<Self>> {
//!         vec![
//!             Method::new("hello", Self::hello)
//!                 .cli()
//!                 .doc("Say hello.\n---\nArgs:\n  name: Who to greet.")
//!                 .param(Param::new("name"))
//!                 .aliases(["hi"]),
//!         ]
//!     }
//! }
//!
//! let mut dispatcher = Dispatcher::new("demo");
//! dispatcher
//!     .register(ControllerClass::of::<Greeter>())
//!     .expect("registration succeeds");
//! let outcome = dispatcher
//!     .dispatch(["demo", "hi", "world"])
//!     .expect("dispatch succeeds")
//!     .expect("command succeeds");
//! assert_eq!(outcome, Outcome::Message(String::from("hello world")));
//! ```

pub mod alias;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::alias::{AliasEntry, AliasRegistry};
pub use self::controller::{Controller, ControllerClass, Handler, Method, MethodSpec, Param};
pub use self::dispatch::{DefaultTarget, Dispatcher, InvocationContext};
pub use self::error::{CommandError, DispatchError, RegistrationError};
pub use self::registry::{ControllerRegistry, PluginDescriptor};
pub use self::schema::{ArgKind, ArgSpec, MethodDescriptor};
pub use self::value::{ArgValue, CallArgs, CommandResult, Namespace, Outcome};

//! Controllers shipped with the `fractal` binary.
//!
//! Both controllers reach the outside world only through [`Services`], so
//! tests can swap the homeserver, the prompt and the container engine for
//! mocks.

mod auth;
mod registration;

use std::rc::Rc;

use fractal_dispatch::{ArgValue, CommandError, ControllerClass};

use crate::containers::ContainerRuntime;
use crate::matrix::Homeserver;
use crate::prompt::Prompt;
use crate::store::UserDataStore;

pub use auth::Auth;
pub use registration::Registration;

/// Collaborators shared by the shipped controllers.
pub struct Services {
    /// Per-user data directory holding the cached credentials.
    pub store: UserDataStore,
    /// Matrix homeserver client.
    pub homeserver: Box<dyn Homeserver>,
    /// Interactive prompts.
    pub prompt: Box<dyn Prompt>,
    /// Local container engine.
    pub containers: Box<dyn ContainerRuntime>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Registration units for every shipped controller.
#[must_use]
pub fn builtin(services: &Rc<Services>) -> Vec<ControllerClass> {
    let for_auth = Rc::clone(services);
    let for_registration = Rc::clone(services);
    vec![
        ControllerClass::new(move || Ok(Auth::new(Rc::clone(&for_auth)))),
        ControllerClass::new(move || Ok(Registration::new(Rc::clone(&for_registration)))),
    ]
}

fn required(value: ArgValue, name: &str) -> Result<String, CommandError> {
    value
        .into_text()
        .ok_or_else(|| failed(anyhow::anyhow!("no value given for {name}")))
}

fn optional(value: ArgValue) -> Option<String> {
    value.into_text().filter(|text| !text.is_empty())
}

fn failed(error: impl Into<anyhow::Error>) -> CommandError {
    CommandError::Failed(error.into())
}

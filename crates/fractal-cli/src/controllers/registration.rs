//! The `registration` controller: account creation and registration tokens.

use std::rc::Rc;

use fractal_dispatch::{CallArgs, CommandError, CommandResult, Controller, Method, Outcome, Param};
use tracing::debug;

use super::{Services, failed, optional, required};
use crate::matrix::MatrixId;
use crate::session::Credentials;

const ALREADY_TAKEN: &str = "User ID already taken";
const LOCAL_SYNAPSE: &str = "http://localhost:8008";

/// Registers Matrix users and manages registration tokens.
#[derive(Debug)]
pub struct Registration {
    services: Rc<Services>,
    credentials: Option<Credentials>,
}

impl Registration {
    /// Creates the controller, picking up cached credentials if present.
    #[must_use]
    pub fn new(services: Rc<Services>) -> Self {
        let credentials = Credentials::load(&services.store);
        Self {
            services,
            credentials,
        }
    }

    fn logged_in(&self) -> Result<&Credentials, CommandError> {
        self.credentials.as_ref().ok_or_else(|| {
            CommandError::exit(
                "You must be logged in to use this command.\nLogin with fractal login.",
            )
        })
    }

    fn homeserver_for(
        &self,
        id: &MatrixId<'_>,
        homeserver_url: Option<String>,
    ) -> Result<String, CommandError> {
        match homeserver_url {
            Some(url) => Ok(url),
            None => self
                .services
                .homeserver
                .discover(id.server())
                .map(|discovery| discovery.homeserver_url)
                .map_err(failed),
        }
    }

    fn register(&mut self, args: CallArgs) -> CommandResult {
        let [matrix_id, password, registration_token, homeserver_url, local] =
            args.into_array()?;
        let user = required(matrix_id, "matrix_id")?;
        let secret = required(password, "password")?;
        let token = required(registration_token, "registration_token")?;
        let id = MatrixId::parse(&user).map_err(|error| CommandError::exit(error.to_string()))?;
        let url = self.homeserver_for(&id, optional(homeserver_url))?;
        let access_token = if local.is_true() {
            self.register_local(&id, &secret, &url)?
        } else {
            self.services
                .homeserver
                .register(&url, id.local(), &secret, &token)
                .map_err(|error| CommandError::exit(format!("Registration failed: {error}")))?
        };
        Ok(Outcome::Message(access_token))
    }

    fn register_local(
        &self,
        id: &MatrixId<'_>,
        password: &str,
        homeserver_url: &str,
    ) -> Result<String, CommandError> {
        let containers = &self.services.containers;
        let container = containers.homeserver_container().map_err(|error| {
            CommandError::exit(format!("No synapse server running locally: {error}."))
        })?;
        let command: Vec<String> = [
            "register_new_matrix_user",
            "-c",
            "/data/homeserver.yaml",
            "-a",
            "-u",
            id.local(),
            "-p",
            password,
            LOCAL_SYNAPSE,
        ]
        .into_iter()
        .map(str::to_owned)
        .collect();
        let result = containers.exec(&container, &command).map_err(failed)?;
        if !result.success() && !result.output.contains(ALREADY_TAKEN) {
            return Err(CommandError::exit(result.output.trim_end()));
        }
        debug!(%container, user = id.local(), "local user is registered");

        let homeserver = &self.services.homeserver;
        let session = homeserver
            .login(homeserver_url, id.local(), password)
            .map_err(|error| CommandError::exit(format!("Error logging in: {error}")))?;
        homeserver
            .override_ratelimit(homeserver_url, &session.access_token, &session.user_id)
            .map_err(failed)?;
        Ok(session.access_token)
    }

    fn token(&mut self, args: CallArgs) -> CommandResult {
        let [action] = args.into_array()?;
        match required(action, "action")?.as_str() {
            "create" => {
                let credentials = self.logged_in()?;
                let token = self
                    .services
                    .homeserver
                    .create_registration_token(
                        &credentials.homeserver_url,
                        &credentials.access_token,
                    )
                    .map_err(failed)?;
                Ok(Outcome::Message(token))
            }
            "list" => {
                let credentials = self.logged_in()?;
                let tokens = self
                    .services
                    .homeserver
                    .list_registration_tokens(
                        &credentials.homeserver_url,
                        &credentials.access_token,
                    )
                    .map_err(failed)?;
                let data = serde_json::to_value(tokens).map_err(failed)?;
                Ok(Outcome::Data(data))
            }
            _ => Err(CommandError::exit(
                "Invalid action. Must be either 'create' or 'list'",
            )),
        }
    }
}

impl Controller for Registration {
    const PLUGIN_NAME: &'static str = "registration";

    fn help() -> Option<&'static str> {
        Some("Register Matrix users and manage registration tokens.")
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("register", Self::register)
                .cli()
                .doc(
                    "Registers a given user with a homeserver. Prints out the registered
                    user's access token.
                    ---
                    Args:
                        matrix_id: Matrix ID of user to register.
                        password: Password to register with.
                        registration_token: Registration token to use.
                        homeserver_url: Homeserver to register with.
                        local: Whether to register locally or not.",
                )
                .param(Param::new("matrix_id"))
                .param(Param::new("password"))
                .param(Param::new("registration_token"))
                .param(Param::optional("homeserver_url"))
                .param(Param::toggle("local", false))
                .aliases(["register"]),
            Method::new("token", Self::token)
                .cli()
                .doc(
                    "Creates or lists registration tokens on the logged in homeserver.
                    ---
                    Args:
                        action: Action to perform. Such as 'create' or 'list'.",
                )
                .param(Param::new("action"))
                .aliases(["token"]),
        ]
    }
}

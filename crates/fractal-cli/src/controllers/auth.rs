//! The `auth` controller: login, logout and inspection of cached credentials.

use std::rc::Rc;

use fractal_dispatch::{CallArgs, CommandError, CommandResult, Controller, Method, Outcome, Param};
use tracing::{info, warn};

use super::{Services, failed, optional, required};
use crate::matrix::{MatrixId, salted_login};
use crate::session::{CredentialKey, Credentials};

const NOT_LOGGED_IN: &str = "You are not logged in.";
const APEX_CHANGED: &str = "Your homeserver apex has changed. Do you want to continue?";

/// Logs in to and out of a Matrix homeserver.
#[derive(Debug)]
pub struct Auth {
    services: Rc<Services>,
}

impl Auth {
    /// Creates the controller over shared services.
    #[must_use]
    pub const fn new(services: Rc<Services>) -> Self {
        Self { services }
    }

    fn login(&mut self, args: CallArgs) -> CommandResult {
        let [matrix_id, homeserver_url, access_token] = args.into_array()?;
        let user = required(matrix_id, "matrix_id")?;
        let credentials = match optional(access_token) {
            None => self.login_with_password(&user, optional(homeserver_url))?,
            Some(token) => {
                let Some(url) = optional(homeserver_url) else {
                    return Err(CommandError::exit(
                        "Please provide a --homeserver-url if logging in with an access token.",
                    ));
                };
                let owner = self
                    .services
                    .homeserver
                    .whoami(&url, &token)
                    .map_err(|error| CommandError::exit(format!("Error logging in: {error}")))?;
                Credentials::new(token, url, owner)
            }
        };
        let path = credentials.save(&self.services.store).map_err(failed)?;
        info!(%path, matrix_id = %credentials.matrix_id, "cached credentials");
        Ok(Outcome::Message(format!(
            "Successfully logged in as {}",
            credentials.matrix_id
        )))
    }

    fn login_with_password(
        &self,
        matrix_id: &str,
        homeserver_url: Option<String>,
    ) -> Result<Credentials, CommandError> {
        let id =
            MatrixId::parse(matrix_id).map_err(|error| CommandError::exit(error.to_string()))?;
        let (url, apex_changed) = match homeserver_url {
            Some(url) => (url, false),
            None => {
                let discovery = self
                    .services
                    .homeserver
                    .discover(id.server())
                    .map_err(failed)?;
                (discovery.homeserver_url, discovery.apex_changed)
            }
        };
        if apex_changed && !self.services.prompt.confirm(APEX_CHANGED).map_err(failed)? {
            return Err(CommandError::exit("Login aborted."));
        }
        let password = self
            .services
            .prompt
            .password(&format!("Password for {matrix_id} on {url}:"))
            .map_err(failed)?;
        let (user, secret) = if apex_changed {
            salted_login(id.local(), &password, &url)
        } else {
            (matrix_id.to_owned(), password)
        };
        let session = self
            .services
            .homeserver
            .login(&url, &user, &secret)
            .map_err(|error| CommandError::exit(format!("Error logging in: {error}")))?;
        Ok(Credentials::new(session.access_token, url, matrix_id))
    }

    fn whoami(&mut self, args: CallArgs) -> CommandResult {
        let [] = args.into_array()?;
        let credentials = Credentials::load(&self.services.store)
            .ok_or_else(|| CommandError::exit(NOT_LOGGED_IN))?;
        Ok(Outcome::Message(format!(
            "You are logged in as {} on {}",
            credentials.matrix_id, credentials.homeserver_url
        )))
    }

    fn logout(&mut self, args: CallArgs) -> CommandResult {
        let [] = args.into_array()?;
        let credentials = Credentials::load(&self.services.store);
        let removed = Credentials::forget(&self.services.store).map_err(failed)?;
        let Some(cached) = credentials.filter(|_| removed) else {
            return Ok(Outcome::Message(String::from(NOT_LOGGED_IN)));
        };
        if let Err(error) = self
            .services
            .homeserver
            .logout(&cached.homeserver_url, &cached.access_token)
        {
            warn!(%error, "homeserver did not invalidate the access token");
        }
        Ok(Outcome::Message(String::from(
            "Successfully logged out. Have a nice day.",
        )))
    }

    fn show(&mut self, args: CallArgs) -> CommandResult {
        let [key] = args.into_array()?;
        let name = required(key, "key")?;
        let credentials = Credentials::load(&self.services.store)
            .ok_or_else(|| CommandError::exit("You are not logged in"))?;
        let field = CredentialKey::parse(&name).ok_or_else(|| {
            CommandError::exit(format!(
                "Unknown key '{name}'. Must be one of access_token, homeserver_url or matrix_id."
            ))
        })?;
        Ok(Outcome::Message(credentials.get(field).to_owned()))
    }
}

impl Controller for Auth {
    const PLUGIN_NAME: &'static str = "auth";

    fn help() -> Option<&'static str> {
        Some("Log in to and out of a Matrix homeserver.")
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("login", Self::login)
                .cli()
                .doc(
                    "Login to a Matrix homeserver.
                    ---
                    Args:
                        matrix_id: Matrix ID of user to login as
                        homeserver_url: Homeserver to login to
                        access_token: Access token to use for login.",
                )
                .param(Param::new("matrix_id"))
                .param(Param::optional("homeserver_url"))
                .param(Param::optional("access_token"))
                .aliases(["login"]),
            Method::new("whoami", Self::whoami)
                .cli()
                .doc("Get information about the current logged in user."),
            Method::new("logout", Self::logout)
                .cli()
                .doc("Logout of Matrix")
                .aliases(["logout"]),
            Method::new("show", Self::show)
                .cli()
                .doc(
                    "Show one value from the cached credentials.
                    ---
                    Args:
                        key: Key to show. Such as 'access_token' or 'homeserver_url'.",
                )
                .param(Param::new("key")),
        ]
    }
}

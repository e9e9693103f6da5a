//! `reqwest` implementation of [`Homeserver`].
//!
//! Each call runs to completion on a private current-thread runtime, so the
//! controllers stay synchronous.

use std::future::Future;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use url::Url;

use super::{Discovery, Homeserver, LoginSession, MatrixError, RegistrationToken, leaves_apex};

const REGISTRATION_TOKEN_STAGE: &str = "m.login.registration_token";
const DUMMY_STAGE: &str = "m.login.dummy";
const MAX_REGISTRATION_ROUNDS: usize = 3;

/// Homeserver client backed by `reqwest`.
#[derive(Debug)]
pub struct HttpHomeserver {
    client: Client,
    runtime: Runtime,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errcode: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct WellKnown {
    #[serde(rename = "m.homeserver")]
    homeserver: BaseUrl,
}

#[derive(Debug, Deserialize)]
struct BaseUrl {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Whoami {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct Registered {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthProgress {
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    completed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenList {
    registration_tokens: Vec<RegistrationToken>,
}

impl HttpHomeserver {
    /// Builds the client and its runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::Runtime`] when the runtime cannot start and
    /// [`MatrixError::Transport`] when the TLS client cannot be built.
    pub fn new() -> Result<Self, MatrixError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(MatrixError::Runtime)?;
        let client = Client::builder()
            .user_agent(concat!("fractal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, runtime })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn register_async(
        &self,
        homeserver_url: &str,
        username: &str,
        password: &str,
        registration_token: &str,
    ) -> Result<String, MatrixError> {
        let url = endpoint(homeserver_url, &["_matrix", "client", "v3", "register"])?;
        let mut progress = AuthProgress::default();
        let mut auth: Option<Value> = None;
        for _ in 0..=MAX_REGISTRATION_ROUNDS {
            let mut body = json!({
                "username": username,
                "password": password,
                "inhibit_login": false,
            });
            if let (Some(stage), Some(object)) = (auth.take(), body.as_object_mut()) {
                object.insert(String::from("auth"), stage);
            }
            let response = self.client.post(url.clone()).json(&body).send().await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                let registered: Registered = decode(response).await?;
                return registered
                    .access_token
                    .ok_or_else(|| MatrixError::Registration {
                        message: String::from("the homeserver returned no access token"),
                    });
            }
            progress = response.json().await.unwrap_or_default();
            debug!(completed = ?progress.completed, "registration requires another stage");
            auth = Some(next_stage(&progress, registration_token));
        }
        Err(MatrixError::Registration {
            message: format!("stages completed so far: {:?}", progress.completed),
        })
    }
}

impl Homeserver for HttpHomeserver {
    fn discover(&self, server_name: &str) -> Result<Discovery, MatrixError> {
        let fallback = format!("https://{server_name}");
        let url = endpoint(&fallback, &[".well-known", "matrix", "client"])?;
        let discovered = self.block_on(async {
            let response = self.client.get(url).send().await?;
            decode::<WellKnown>(response).await
        });
        let homeserver_url = match discovered {
            Ok(well_known) => well_known
                .homeserver
                .base_url
                .trim_end_matches('/')
                .to_owned(),
            Err(error) => {
                debug!(%error, server_name, "no usable .well-known; using the server name");
                fallback
            }
        };
        let apex_changed = leaves_apex(server_name, &homeserver_url);
        Ok(Discovery {
            homeserver_url,
            apex_changed,
        })
    }

    fn login(
        &self,
        homeserver_url: &str,
        user: &str,
        password: &str,
    ) -> Result<LoginSession, MatrixError> {
        let url = endpoint(homeserver_url, &["_matrix", "client", "v3", "login"])?;
        let body = json!({
            "type": "m.login.password",
            "identifier": { "type": "m.id.user", "user": user },
            "password": password,
            "initial_device_display_name": "fractal",
        });
        self.block_on(send(self.client.post(url).json(&body)))
    }

    fn whoami(&self, homeserver_url: &str, access_token: &str) -> Result<String, MatrixError> {
        let url = endpoint(
            homeserver_url,
            &["_matrix", "client", "v3", "account", "whoami"],
        )?;
        let request = self.client.get(url).bearer_auth(access_token);
        self.block_on(send::<Whoami>(request))
            .map(|whoami| whoami.user_id)
    }

    fn logout(&self, homeserver_url: &str, access_token: &str) -> Result<(), MatrixError> {
        let url = endpoint(homeserver_url, &["_matrix", "client", "v3", "logout"])?;
        let request = self.client.post(url).bearer_auth(access_token).json(&json!({}));
        self.block_on(send::<Value>(request)).map(drop)
    }

    fn register(
        &self,
        homeserver_url: &str,
        username: &str,
        password: &str,
        registration_token: &str,
    ) -> Result<String, MatrixError> {
        self.block_on(self.register_async(homeserver_url, username, password, registration_token))
    }

    fn create_registration_token(
        &self,
        homeserver_url: &str,
        access_token: &str,
    ) -> Result<String, MatrixError> {
        let url = endpoint(
            homeserver_url,
            &["_synapse", "admin", "v1", "registration_tokens", "new"],
        )?;
        let request = self.client.post(url).bearer_auth(access_token).json(&json!({}));
        self.block_on(send::<RegistrationToken>(request))
            .map(|created| created.token)
    }

    fn list_registration_tokens(
        &self,
        homeserver_url: &str,
        access_token: &str,
    ) -> Result<Vec<RegistrationToken>, MatrixError> {
        let url = endpoint(
            homeserver_url,
            &["_synapse", "admin", "v1", "registration_tokens"],
        )?;
        let request = self.client.get(url).bearer_auth(access_token);
        self.block_on(send::<TokenList>(request))
            .map(|list| list.registration_tokens)
    }

    fn override_ratelimit(
        &self,
        homeserver_url: &str,
        access_token: &str,
        user_id: &str,
    ) -> Result<(), MatrixError> {
        let url = endpoint(
            homeserver_url,
            &["_synapse", "admin", "v1", "users", user_id, "override_ratelimit"],
        )?;
        let body = json!({ "messages_per_second": 0, "burst_count": 0 });
        let request = self.client.post(url).bearer_auth(access_token).json(&body);
        self.block_on(send::<Value>(request)).map(drop)
    }
}

/// Appends percent-encoded `segments` to the path of `base`.
pub(super) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, MatrixError> {
    let invalid = || MatrixError::InvalidUrl {
        url: base.to_owned(),
    };
    let mut url = Url::parse(base).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn next_stage(progress: &AuthProgress, registration_token: &str) -> Value {
    let stage = if progress
        .completed
        .iter()
        .any(|completed| completed == REGISTRATION_TOKEN_STAGE)
    {
        json!({ "type": DUMMY_STAGE })
    } else {
        json!({ "type": REGISTRATION_TOKEN_STAGE, "token": registration_token })
    };
    match (stage, progress.session.as_deref()) {
        (Value::Object(mut object), Some(session)) => {
            object.insert(String::from("session"), Value::from(session));
            Value::Object(object)
        }
        (other, _) => other,
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, MatrixError> {
    decode(request.send().await?).await
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MatrixError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body: ErrorBody = response.json().await.unwrap_or_default();
    Err(MatrixError::Api {
        status: status.as_u16(),
        errcode: body.errcode,
        message: body.error,
    })
}

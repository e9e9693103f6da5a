//! Test doubles for the CLI runtime.
//!
//! Mocks for the homeserver, prompt and container seams, a configuration
//! loader that ignores the command line, and the world used by the
//! behavioural scenarios.

use std::ffi::OsString;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use fractal_config::{Config, OutputFormat};
use mockall::mock;
use rstest::fixture;
use tempfile::TempDir;

use crate::containers::{ContainerError, ContainerRuntime, ExecOutput};
use crate::controllers::Services;
use crate::matrix::{Discovery, Homeserver, LoginSession, MatrixError, RegistrationToken};
use crate::prompt::{Prompt, PromptError};
use crate::session::Credentials;
use crate::store::UserDataStore;
use crate::{AppError, ConfigLoader, IoStreams, run_with_loader};

mock! {
    pub Server {}
    impl Homeserver for Server {
        fn discover(&self, server_name: &str) -> Result<Discovery, MatrixError>;
        fn login(
            &self,
            homeserver_url: &str,
            user: &str,
            password: &str,
        ) -> Result<LoginSession, MatrixError>;
        fn whoami(&self, homeserver_url: &str, access_token: &str) -> Result<String, MatrixError>;
        fn logout(&self, homeserver_url: &str, access_token: &str) -> Result<(), MatrixError>;
        fn register(
            &self,
            homeserver_url: &str,
            username: &str,
            password: &str,
            registration_token: &str,
        ) -> Result<String, MatrixError>;
        fn create_registration_token(
            &self,
            homeserver_url: &str,
            access_token: &str,
        ) -> Result<String, MatrixError>;
        fn list_registration_tokens(
            &self,
            homeserver_url: &str,
            access_token: &str,
        ) -> Result<Vec<RegistrationToken>, MatrixError>;
        fn override_ratelimit(
            &self,
            homeserver_url: &str,
            access_token: &str,
            user_id: &str,
        ) -> Result<(), MatrixError>;
    }
}

mock! {
    pub Ask {}
    impl Prompt for Ask {
        fn password(&self, message: &str) -> Result<String, PromptError>;
        fn confirm(&self, message: &str) -> Result<bool, PromptError>;
    }
}

mock! {
    pub Engine {}
    impl ContainerRuntime for Engine {
        fn homeserver_container(&self) -> Result<String, ContainerError>;
        fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, ContainerError>;
    }
}

pub(super) const HOMESERVER: &str = "https://matrix.example.org";
pub(super) const ALICE: &str = "@alice:example.org";

pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Homeserver that accepts logouts and serves a fixed token list.
pub(super) fn permissive_server(tokens: Vec<RegistrationToken>) -> MockServer {
    let mut server = MockServer::new();
    server.expect_logout().returning(|_, _| Ok(()));
    server
        .expect_list_registration_tokens()
        .returning(move |_, _| Ok(tokens.clone()));
    server
}

/// Services rooted at the configured data directory.
pub(super) fn services_for(config: &Config, tokens: &[RegistrationToken]) -> Services {
    Services {
        store: UserDataStore::new(config.data_dir().to_owned()),
        homeserver: Box::new(permissive_server(tokens.to_vec())),
        prompt: Box::new(MockAsk::new()),
        containers: Box::new(MockEngine::new()),
    }
}

pub(super) struct TestWorld {
    _dir: TempDir,
    pub(super) config: Config,
    pub(super) tokens: Vec<RegistrationToken>,
    pub(super) stdout: Vec<u8>,
    pub(super) stderr: Vec<u8>,
    pub(super) exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("temporary directory");
        let data_dir =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temporary path");
        let config = Config {
            data_dir,
            output: OutputFormat::Json,
            ..Config::default()
        };
        Self {
            _dir: dir,
            config,
            tokens: Vec::new(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        }
    }

    pub(super) fn store(&self) -> UserDataStore {
        UserDataStore::new(self.config.data_dir().to_owned())
    }

    pub(super) fn cache_credentials(&self) {
        Credentials::new("syt_token", HOMESERVER, ALICE)
            .save(&self.store())
            .expect("credentials saved");
    }

    pub(super) fn run(&mut self, command: &str) {
        self.stdout.clear();
        self.stderr.clear();
        let args = Self::build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let tokens = self.tokens.clone();
        let factory = move |config: &Config| -> Result<Services, AppError> {
            Ok(services_for(config, &tokens))
        };
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr, false);
        let exit = run_with_loader(args, &mut io, &loader, &factory);
        self.exit_code = Some(exit);
    }

    fn build_args(command: &str) -> Vec<OsString> {
        std::iter::once("fractal")
            .chain(command.trim().trim_matches('"').split_whitespace())
            .map(OsString::from)
            .collect()
    }

    pub(super) fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    pub(super) fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }
}

#[fixture]
pub(super) fn world() -> TestWorld {
    TestWorld::new()
}

//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use fractal_dispatch::{DispatchError, RegistrationError};
use thiserror::Error;

use crate::matrix::MatrixError;
use crate::output::RenderError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the homeserver client: {0}")]
    Homeserver(#[from] MatrixError),
    #[error("failed to register controllers: {0}")]
    Registration(#[from] RegistrationError),
    #[error("{0}")]
    Dispatch(#[from] DispatchError),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

//! Runner-level tests and the doubles they share with the controller tests.

pub(crate) mod support;

//! Shared helpers for the in-crate tests.

pub(crate) mod quick;

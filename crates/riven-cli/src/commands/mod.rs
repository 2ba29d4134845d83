//! Command handlers grouped by concern.

pub(crate) mod applications;
pub(crate) mod settings;

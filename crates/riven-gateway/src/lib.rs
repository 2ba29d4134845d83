#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, dead_code, unused)]

//! Settings gateway, local file mirror and page controllers.
//!
//! Layout:
//! - `gateway.rs`: the `SettingsGateway` trait shared by every backend
//! - `http.rs`: REST gateway talking to the Riven backend
//! - `memory.rs`: in-process gateway for tests and offline runs
//! - `mirror.rs`: the applications mirror file and the service catalog
//! - `page.rs`: load/submit orchestration per settings group

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod mirror;
pub mod page;

pub use error::{GatewayError, GatewayResult, MirrorError, MirrorResult, PageError, PageResult};
pub use gateway::{ApplyOutcome, SettingsGateway, SharedGateway};
pub use http::{DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT, GatewayConfig, HttpSettingsGateway};
pub use memory::MemoryGateway;
pub use mirror::{FileMirror, MirrorDocument, MirrorDossiers, MirrorPaths};
pub use page::{
    ApplicationSubmission, ApplicationsForm, ApplicationsPage, LoadedForm, SAVED_MESSAGE,
    SettingsPage, SubmitOutcome,
};

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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (settings documents), home.rs (temporary home directory trees).

pub mod fixtures;
pub mod home;

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

//! Bidirectional transforms between flat settings forms and the nested
//! settings document served by the Riven backend.
//!
//! Layout: `path.rs` (dotted document paths), `schema.rs` (field schema and
//! validation), `group.rs` (`SettingsGroup` and the table-driven transform),
//! `groups/` (the seven groups and their registry), `patch.rs` (outgoing
//! overwrites), `catalog.rs` (service listing parsing).

pub mod catalog;
pub mod error;
pub mod group;
pub mod groups;
pub mod patch;
pub mod path;
pub mod schema;
mod validate;

pub use catalog::{ServiceCatalog, ServiceItem, parse_service_listing};
pub use error::{FieldError, SettingsError, SettingsResult, ValidationErrors};
pub use group::{FieldBinding, GroupId, SettingsGroup, TableGroup, TableGroupBuilder};
pub use groups::{ApplicationRecord, ApplicationsGroup, SeedboxGroup, all_groups, applications, group};
pub use patch::{Patch, PatchEntry};
pub use path::DocumentPath;
pub use schema::{AUTH_METHODS, FieldKind, FieldSchema, FieldSpec, FlatFields, TextRule};

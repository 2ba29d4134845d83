//! The seven settings groups and their registry.

mod applications;
mod content;
mod general;
mod media_server;
mod scrapers;
mod seedbox;
mod zurg;

use once_cell::sync::Lazy;

use crate::group::{GroupId, SettingsGroup, TableGroup};

pub use applications::{
    APPLICATION_AUTH_KEY, ApplicationRecord, ApplicationsGroup, DEFAULT_AUTH_METHOD,
};
pub use general::DEFAULT_DATABASE_HOST;
pub use scrapers::DEFAULT_STREAM_FILTER;
pub use seedbox::{FORCED_AUTH_METHOD, OAUTH_METHOD, SeedboxGroup};

static GENERAL: Lazy<TableGroup> = Lazy::new(general::table);
static ZURG: Lazy<TableGroup> = Lazy::new(zurg::table);
static SEEDBOX: Lazy<SeedboxGroup> = Lazy::new(SeedboxGroup::new);
static APPLICATIONS: Lazy<ApplicationsGroup> = Lazy::new(ApplicationsGroup::new);
static MEDIA_SERVER: Lazy<TableGroup> = Lazy::new(media_server::table);
static SCRAPERS: Lazy<TableGroup> = Lazy::new(scrapers::table);
static CONTENT: Lazy<TableGroup> = Lazy::new(content::table);

/// Shared definition of the group identified by `id`.
#[must_use]
pub fn group(id: GroupId) -> &'static dyn SettingsGroup {
    match id {
        GroupId::General => &*GENERAL,
        GroupId::Zurg => &*ZURG,
        GroupId::Seedbox => &*SEEDBOX,
        GroupId::Applications => &*APPLICATIONS,
        GroupId::MediaServer => &*MEDIA_SERVER,
        GroupId::Scrapers => &*SCRAPERS,
        GroupId::Content => &*CONTENT,
    }
}

/// Every group in menu order.
pub fn all_groups() -> impl Iterator<Item = &'static dyn SettingsGroup> {
    GroupId::ALL.into_iter().map(group)
}

/// Applications group with its append-aware reverse transform.
#[must_use]
pub fn applications() -> &'static ApplicationsGroup {
    &APPLICATIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_id() {
        for id in GroupId::ALL {
            assert_eq!(group(id).id(), id);
            assert!(!group(id).fetch_keys().is_empty());
            assert!(!group(id).owned_keys().is_empty());
        }
        assert_eq!(all_groups().count(), GroupId::ALL.len());
    }

    #[test]
    fn bound_schema_fields_are_unique() {
        for group in all_groups() {
            let mut names: Vec<&str> = group.schema().fields().map(|spec| spec.name()).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate field in {}", group.id());
        }
    }
}

//! Zurg settings: debrid accounts, media toggle and the rclone/library mount points.

use crate::group::{GroupId, TableGroup};
use crate::schema::{FieldSpec, TextRule};

const FETCH_KEYS: &[&str] = &["downloaders", "media", "symlink"];
const OWNED_KEYS: &[&str] = &["symlink", "downloaders", "media"];

const NON_EMPTY: TextRule = TextRule::MinLength {
    min: 1,
    message: "String must contain at least 1 character(s)",
};

pub(super) fn table() -> TableGroup {
    TableGroup::builder(GroupId::Zurg)
        .fetch(FETCH_KEYS)
        .owns(OWNED_KEYS)
        .field(FieldSpec::required_text("library_path", NON_EMPTY), "symlink.library_path")
        .field(FieldSpec::required_text("rclone_path", NON_EMPTY), "symlink.rclone_path")
        .field(FieldSpec::boolean("realdebrid_enabled", false), "downloaders.real_debrid.enabled")
        .field(FieldSpec::text("realdebrid_api_key", ""), "downloaders.real_debrid.api_key")
        .field(FieldSpec::boolean("alldebrid_enabled", false), "downloaders.all_debrid.enabled")
        .field(FieldSpec::text("alldebrid_api_key", ""), "downloaders.all_debrid.api_key")
        .field(FieldSpec::boolean("media_enabled", false), "media.enabled")
        .field(FieldSpec::text_list("media_on_item_type"), "media.on_item_type")
        .build()
}

//! Media server updater settings.

use crate::group::{GroupId, TableGroup};
use crate::schema::FieldSpec;

const KEYS: &[&str] = &["updaters"];

pub(super) fn table() -> TableGroup {
    TableGroup::builder(GroupId::MediaServer)
        .fetch(KEYS)
        .owns(KEYS)
        .field(FieldSpec::integer("update_interval", 0, 120), "updaters.update_interval")
        .field(FieldSpec::boolean("plex_enabled", false), "updaters.plex.enabled")
        .field(FieldSpec::text("plex_token", ""), "updaters.plex.token")
        .field(FieldSpec::text("plex_url", ""), "updaters.plex.url")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SettingsGroup;
    use serde_json::json;

    #[test]
    fn plex_block_round_trips() -> anyhow::Result<()> {
        let stored = json!({
            "updaters": {
                "update_interval": 90,
                "plex": {"enabled": true, "token": "tok", "url": "http://plex:32400"}
            }
        });
        let fields = table().load_form(&stored)?;
        let patch = table().to_document_patch(&fields)?;
        assert_eq!(patch.into_fragment(), stored);
        Ok(())
    }
}

//! Hosted applications: one editable application record plus the per-label
//! authentication and domain maps kept under `dossiers`.
//!
//! # Design
//! - Only the first stored application is surfaced in the form.
//! - The reverse transform appends the edited record to a caller-supplied list
//!   of existing records. Deduplication belongs to the caller, except in
//!   [`SettingsGroup::to_document_patch_over`], which replaces a stored record
//!   carrying the same label.
//! - Ids are emitted as strings and read back as integers when numeric.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::group::{GroupId, SettingsGroup, TableGroup};
use crate::patch::Patch;
use crate::schema::{AUTH_METHODS, FieldSchema, FieldSpec, FlatFields};
use crate::validate::{coerce_integer, is_truthy};

/// Method assigned to labels with no stored authentication method.
pub const DEFAULT_AUTH_METHOD: &str = "basique";

/// Key of the application-wide entry in the authentication map.
pub const APPLICATION_AUTH_KEY: &str = "authappli";

const FETCH_KEYS: &[&str] = &[
    "authentification",
    "applications",
    "dossiers",
    "domaine",
    "adapters",
    "updaters",
];
const OWNED_KEYS: &[&str] = &["applications", "dossiers", "updaters"];
const MERGE_KEYS: &[&str] = &["applications"];

/// Stored `{id, label}` application entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Identifier, stored as a string whatever the form submitted.
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: String,
    /// Service label, also used as the key of the `dossiers` maps.
    #[serde(default)]
    pub label: String,
}

impl ApplicationRecord {
    /// JSON form written into the `applications` list.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({"id": self.id, "label": self.label})
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "application id must be a number or string, got {other}"
        ))),
    }
}

/// Applications group.
#[derive(Debug, Clone)]
pub struct ApplicationsGroup {
    table: TableGroup,
}

impl ApplicationsGroup {
    pub(super) fn new() -> Self {
        let table = TableGroup::builder(GroupId::Applications)
            .fetch(FETCH_KEYS)
            .owns(OWNED_KEYS)
            .unbound(FieldSpec::identifier("id"))
            .unbound(FieldSpec::text("label", ""))
            .unbound(FieldSpec::label_list("dossiers_on_item_type"))
            .unbound(FieldSpec::choice_map("authentification", AUTH_METHODS))
            .unbound(FieldSpec::text_map("domaine", true))
            .field(FieldSpec::text("plex_token", ""), "updaters.plex.token")
            .field(FieldSpec::text("plex_login", ""), "updaters.plex.login")
            .field(FieldSpec::text("plex_password", ""), "updaters.plex.password")
            .build();
        Self { table }
    }

    /// Form shown when no application is stored yet.
    #[must_use]
    pub fn empty_form(&self) -> FlatFields {
        let mut fields = self.table.schema().defaults();
        let mut authentification = Map::new();
        authentification.insert(
            APPLICATION_AUTH_KEY.to_string(),
            Value::String(DEFAULT_AUTH_METHOD.to_string()),
        );
        fields.insert("authentification", Value::Object(authentification));
        fields
    }

    /// Application record described by a validated form.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingField`] when `id` or `label` is absent.
    pub fn record_from(fields: &FlatFields) -> SettingsResult<ApplicationRecord> {
        Ok(ApplicationRecord {
            id: id_string(required(fields, "id")?),
            label: required(fields, "label")?
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Reverse transform appending the edited record to `existing`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingField`] when `fields` lacks a form field.
    pub fn to_document_patch_with(
        &self,
        fields: &FlatFields,
        existing: &[ApplicationRecord],
    ) -> SettingsResult<Patch> {
        let record = Self::record_from(fields)?;
        let applications: Vec<Value> = existing
            .iter()
            .chain(std::iter::once(&record))
            .map(ApplicationRecord::to_value)
            .collect();

        let on_item_type: Vec<Value> = required(fields, "dossiers_on_item_type")?
            .as_array()
            .map(|items| items.iter().filter_map(item_label).map(Value::from).collect())
            .unwrap_or_default();
        let dossiers = json!({
            "on_item_type": on_item_type,
            "authentification": required(fields, "authentification")?,
            "domaine": required(fields, "domaine")?,
        });

        let mut patch = Patch::new();
        patch.push("applications", Value::Array(applications));
        patch.push("dossiers", dossiers);
        for entry in self.table.to_document_patch(fields)? {
            patch.push(entry.key, entry.value);
        }
        debug!(label = %record.label, existing = existing.len(), "built applications patch");
        Ok(patch)
    }
}

impl SettingsGroup for ApplicationsGroup {
    fn id(&self) -> GroupId {
        GroupId::Applications
    }

    fn fetch_keys(&self) -> &'static [&'static str] {
        FETCH_KEYS
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        OWNED_KEYS
    }

    fn schema(&self) -> &FieldSchema {
        self.table.schema()
    }

    fn to_form_model(&self, fragment: &Value) -> FlatFields {
        let Some(selected) = selected_application(fragment) else {
            debug!("no stored application, using defaults");
            return self.empty_form();
        };

        let mut fields = self.table.to_form_model(fragment);
        fields.insert("id", normalize_id(selected.get("id")));
        fields.insert(
            "label",
            selected
                .get("label")
                .filter(|label| is_truthy(label))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new())),
        );

        let dossiers = fragment.get("dossiers");
        let labels: Vec<String> = dossiers
            .and_then(|dossiers| dossiers.get("on_item_type"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(item_label).map(str::to_string).collect())
            .unwrap_or_default();

        let stored_auth = dossiers.and_then(|dossiers| dossiers.get("authentification"));
        let stored_domains = dossiers.and_then(|dossiers| dossiers.get("domaine"));
        let mut authentification = Map::new();
        let mut domaine = Map::new();
        for label in &labels {
            let method = stored_auth
                .and_then(|auth| auth.get(label))
                .filter(|method| !method.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String(DEFAULT_AUTH_METHOD.to_string()));
            authentification.insert(label.clone(), method);
            let domain = stored_domains
                .and_then(|domains| domains.get(label))
                .filter(|domain| is_truthy(domain))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            domaine.insert(label.clone(), domain);
        }

        fields.insert(
            "dossiers_on_item_type",
            Value::Array(labels.iter().map(|label| json!({"label": label})).collect()),
        );
        fields.insert("authentification", Value::Object(authentification));
        fields.insert("domaine", Value::Object(domaine));
        fields
    }

    fn to_document_patch(&self, fields: &FlatFields) -> SettingsResult<Patch> {
        self.to_document_patch_with(fields, &[])
    }

    fn merge_keys(&self) -> &'static [&'static str] {
        MERGE_KEYS
    }

    fn to_document_patch_over(&self, fields: &FlatFields, stored: &Value) -> SettingsResult<Patch> {
        let label = required(fields, "label")?.as_str().unwrap_or_default();
        let existing: Vec<ApplicationRecord> = stored_records(stored)
            .into_iter()
            .filter(|record| record.label != label)
            .collect();
        self.to_document_patch_with(fields, &existing)
    }
}

fn selected_application(fragment: &Value) -> Option<&Value> {
    fragment.get("applications")?.as_array()?.first()
}

/// Records of a stored `applications` list; entries that are not records are skipped.
fn stored_records(stored: &Value) -> Vec<ApplicationRecord> {
    stored
        .get("applications")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| ApplicationRecord::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_id(raw: Option<&Value>) -> Value {
    match raw.filter(|id| is_truthy(id)) {
        None => Value::from(0),
        Some(id) => coerce_integer(id).map_or_else(|_| id.clone(), Value::from),
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Label of an `on_item_type` entry, stored either as a bare string or as `{label}`.
fn item_label(item: &Value) -> Option<&str> {
    match item {
        Value::String(label) => Some(label.as_str()),
        Value::Object(map) => map.get("label").and_then(Value::as_str),
        _ => None,
    }
}

fn required<'a>(fields: &'a FlatFields, name: &str) -> SettingsResult<&'a Value> {
    fields.get(name).ok_or_else(|| SettingsError::MissingField {
        group: GroupId::Applications,
        field: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Value {
        json!({
            "applications": [{"id": "7", "label": "sonarr"}, {"id": "8", "label": "radarr"}],
            "dossiers": {
                "on_item_type": ["sonarr", "radarr"],
                "authentification": {"sonarr": "oauth", "radarr": null},
                "domaine": {"sonarr": "tv.example.com"}
            },
            "updaters": {"plex": {"token": "tok"}}
        })
    }

    #[test]
    fn empty_list_yields_exact_defaults() {
        let group = ApplicationsGroup::new();
        for fragment in [json!({}), json!({"applications": []}), json!({"applications": null})] {
            assert_eq!(
                group.to_form_model(&fragment).into_value(),
                json!({
                    "id": 0,
                    "label": "",
                    "dossiers_on_item_type": [],
                    "authentification": {"authappli": "basique"},
                    "domaine": {},
                    "plex_token": "",
                    "plex_login": "",
                    "plex_password": ""
                })
            );
        }
    }

    #[test]
    fn first_application_is_selected_and_maps_are_completed() -> anyhow::Result<()> {
        let fields = ApplicationsGroup::new().load_form(&stored())?;
        assert_eq!(fields.get("id"), Some(&json!(7)));
        assert_eq!(fields.get("label"), Some(&json!("sonarr")));
        assert_eq!(
            fields.get("dossiers_on_item_type"),
            Some(&json!([{"label": "sonarr"}, {"label": "radarr"}]))
        );
        assert_eq!(
            fields.get("authentification"),
            Some(&json!({"sonarr": "oauth", "radarr": "basique"}))
        );
        assert_eq!(
            fields.get("domaine"),
            Some(&json!({"sonarr": "tv.example.com", "radarr": ""}))
        );
        assert_eq!(fields.get("plex_token"), Some(&json!("tok")));
        assert_eq!(fields.get("plex_login"), Some(&json!("")));
        Ok(())
    }

    #[test]
    fn non_list_applications_yield_defaults() {
        let group = ApplicationsGroup::new();
        let dossiers = json!({"on_item_type": ["sonarr"], "authentification": {"sonarr": "oauth"}});
        for applications in [json!("oops"), json!({"id": 3, "label": "plex"}), json!(5)] {
            let fields = group.to_form_model(&json!({
                "applications": applications,
                "dossiers": dossiers.clone()
            }));
            assert_eq!(fields, group.empty_form());
        }
    }

    #[test]
    fn stored_records_are_kept_when_patching_over_them() -> anyhow::Result<()> {
        let group = ApplicationsGroup::new();
        let stored = stored();
        let fields = group.load_form(&stored)?;
        let patch = group.to_document_patch_over(&fields, &stored)?;
        assert_eq!(
            patch.get("applications"),
            Some(&json!([{"id": "8", "label": "radarr"}, {"id": "7", "label": "sonarr"}]))
        );
        Ok(())
    }

    #[test]
    fn submit_over_adds_new_label_after_stored_ones() -> anyhow::Result<()> {
        let patch = ApplicationsGroup::new().submit_over(
            &json!({"id": "svc-3", "label": "lidarr"}),
            &json!({"applications": [{"label": "sonarr"}, "junk", {"id": 2, "label": "radarr"}]}),
        )?;
        assert_eq!(
            patch.get("applications"),
            Some(&json!([
                {"id": "", "label": "sonarr"},
                {"id": "2", "label": "radarr"},
                {"id": "svc-3", "label": "lidarr"}
            ]))
        );
        Ok(())
    }

    #[test]
    fn opaque_string_ids_survive_load_and_submit() -> anyhow::Result<()> {
        let group = ApplicationsGroup::new();
        let stored = json!({"applications": [{"id": "abc", "label": "sonarr"}]});
        let fields = group.load_form(&stored)?;
        assert_eq!(fields.get("id"), Some(&json!("abc")));
        let patch = group.to_document_patch_over(&fields, &stored)?;
        assert_eq!(
            patch.get("applications"),
            Some(&json!([{"id": "abc", "label": "sonarr"}]))
        );
        Ok(())
    }

    #[test]
    fn patch_appends_to_existing_records() -> anyhow::Result<()> {
        let group = ApplicationsGroup::new();
        let fields = group.schema().validate(&json!({
            "id": "12",
            "label": "lidarr",
            "dossiers_on_item_type": [{"label": "lidarr"}],
            "authentification": {"lidarr": "authelia"},
            "domaine": {"lidarr": "music.example.com"}
        }))?;
        let existing = vec![ApplicationRecord {
            id: "1".to_string(),
            label: "sonarr".to_string(),
        }];
        let patch = group.to_document_patch_with(&fields, &existing)?;
        assert_eq!(patch.keys().collect::<Vec<_>>(), OWNED_KEYS.to_vec());
        assert_eq!(
            patch.get("applications"),
            Some(&json!([{"id": "1", "label": "sonarr"}, {"id": "12", "label": "lidarr"}]))
        );
        assert_eq!(
            patch.get("dossiers"),
            Some(&json!({
                "on_item_type": ["lidarr"],
                "authentification": {"lidarr": "authelia"},
                "domaine": {"lidarr": "music.example.com"}
            }))
        );
        assert_eq!(
            patch.get("updaters"),
            Some(&json!({"plex": {"token": "", "login": "", "password": ""}}))
        );
        Ok(())
    }

    #[test]
    fn unknown_auth_method_is_rejected() {
        let errors = ApplicationsGroup::new()
            .schema()
            .validate(&json!({"authentification": {"sonarr": "kerberos"}}))
            .unwrap_err();
        assert!(errors.message_for("authentification.sonarr").is_some());
    }

    #[test]
    fn records_accept_numeric_ids() -> anyhow::Result<()> {
        let records: Vec<ApplicationRecord> =
            serde_json::from_value(json!([{"id": 4, "label": "a"}, {"id": "5", "label": "b"}]))?;
        assert_eq!(records[0].id, "4");
        assert_eq!(records[1].id, "5");
        Ok(())
    }
}

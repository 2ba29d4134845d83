//! Settings groups and the table-driven transform layer.
//!
//! # Design
//! - Each group declares which top-level document keys it fetches, which it
//!   owns on write, its [`FieldSchema`], and a binding table mapping every form
//!   field to one nested document path.
//! - [`TableGroup`] derives both transform directions from that table, so the
//!   binding table is the single source of truth for the compatibility surface.
//! - Groups with extra policy (seedbox, applications) wrap a [`TableGroup`].

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{SettingsError, SettingsResult, ValidationErrors};
use crate::patch::Patch;
use crate::path::{self, DocumentPath};
use crate::schema::{FieldKind, FieldSchema, FieldSpec, FlatFields};

/// Identifier of a settings group (one settings form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupId {
    /// Logging, symlink, downloader, database, notification and subtitle settings.
    General,
    /// Debrid-mount settings used by the zurg onboarding flow.
    Zurg,
    /// Seedbox account, domain, Cloudflare and reverse-proxy authentication.
    Seedbox,
    /// Hosted applications with per-application auth and domain overrides.
    Applications,
    /// Media server updater settings.
    MediaServer,
    /// Scraper integrations.
    Scrapers,
    /// Content list sources.
    Content,
}

impl GroupId {
    /// Every group in menu order.
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::Zurg,
        Self::Seedbox,
        Self::Applications,
        Self::MediaServer,
        Self::Scrapers,
        Self::Content,
    ];

    /// Render the identifier as used on the command line and in routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Zurg => "zurg",
            Self::Seedbox => "seedbox",
            Self::Applications => "applications",
            Self::MediaServer => "media-server",
            Self::Scrapers => "scrapers",
            Self::Content => "content",
        }
    }
}

impl FromStr for GroupId {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s || (s == "mediaserver" && *id == Self::MediaServer))
            .ok_or_else(|| SettingsError::UnknownGroup {
                value: s.to_string(),
            })
    }
}

impl Display for GroupId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Bidirectional mapping between a flat form and fragments of the settings document.
pub trait SettingsGroup: Send + Sync {
    /// Group identifier.
    fn id(&self) -> GroupId;

    /// Top-level document keys the gateway must fetch before [`Self::to_form_model`].
    fn fetch_keys(&self) -> &'static [&'static str];

    /// Top-level document keys written by [`Self::to_document_patch`], in write order.
    fn owned_keys(&self) -> &'static [&'static str];

    /// Form schema for this group.
    fn schema(&self) -> &FieldSchema;

    /// Project a (possibly partial) document fragment onto the flat form.
    ///
    /// Never fails: absent nested values yield field defaults, and required
    /// fields without a stored value are left for validation to report.
    fn to_form_model(&self, fragment: &Value) -> FlatFields;

    /// Rebuild the owned top-level keys from a validated flat record.
    ///
    /// # Errors
    ///
    /// Returns a structural error when a bound field is missing from `fields`.
    fn to_document_patch(&self, fields: &FlatFields) -> SettingsResult<Patch>;

    /// Top-level keys whose stored values the reverse transform merges with.
    ///
    /// Groups that rewrite a whole list from a single edited entry name the list
    /// here so callers can fetch it before submitting.
    fn merge_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Reverse transform merged with the currently `stored` fragment.
    ///
    /// # Errors
    ///
    /// Returns a structural error when a bound field is missing from `fields`.
    fn to_document_patch_over(&self, fields: &FlatFields, _stored: &Value) -> SettingsResult<Patch> {
        self.to_document_patch(fields)
    }

    /// Forward transform followed by schema validation, as done on page load.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] when stored values violate the schema.
    fn load_form(&self, fragment: &Value) -> Result<FlatFields, ValidationErrors> {
        self.schema()
            .validate(&self.to_form_model(fragment).into_value())
    }

    /// Schema validation followed by the reverse transform, as done on submit.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] for invalid input, or a structural
    /// error from the reverse transform.
    fn submit(&self, input: &Value) -> SettingsResult<Patch> {
        let fields = self.schema().validate(input)?;
        self.to_document_patch(&fields)
    }

    /// [`Self::submit`] merging with the `stored` values of [`Self::merge_keys`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    fn submit_over(&self, input: &Value, stored: &Value) -> SettingsResult<Patch> {
        let fields = self.schema().validate(input)?;
        self.to_document_patch_over(&fields, stored)
    }
}

/// One row of a binding table: form field path to document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Dotted form field name (`traefik.oauth_client` for nested form objects).
    pub form: DocumentPath,
    /// Dotted settings document path.
    pub document: DocumentPath,
}

/// Settings group whose transforms are generated from a binding table.
#[derive(Debug, Clone)]
pub struct TableGroup {
    id: GroupId,
    fetch_keys: &'static [&'static str],
    owned_keys: &'static [&'static str],
    schema: FieldSchema,
    bindings: Vec<FieldBinding>,
}

impl TableGroup {
    /// Start declaring a group.
    #[must_use]
    pub const fn builder(id: GroupId) -> TableGroupBuilder {
        TableGroupBuilder {
            id,
            fetch_keys: &[],
            owned_keys: &[],
            fields: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Binding table rows in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Document path bound to the form field `form`.
    #[must_use]
    pub fn document_path(&self, form: &str) -> Option<&DocumentPath> {
        self.bindings
            .iter()
            .find(|binding| binding.form.to_string() == form)
            .map(|binding| &binding.document)
    }
}

impl SettingsGroup for TableGroup {
    fn id(&self) -> GroupId {
        self.id
    }

    fn fetch_keys(&self) -> &'static [&'static str] {
        self.fetch_keys
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        self.owned_keys
    }

    fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn to_form_model(&self, fragment: &Value) -> FlatFields {
        let mut fields = FlatFields::new();
        for binding in &self.bindings {
            let value = match self.schema.default_at(&binding.form) {
                Some(default) => Some(path::lookup_or(fragment, &binding.document, default)),
                None => path::lookup(fragment, &binding.document).cloned(),
            };
            let Some(value) = value else {
                debug!(group = %self.id, field = %binding.form, "stored value absent for required field");
                continue;
            };
            if let Err(err) = fields.insert_path(&binding.form, value) {
                warn!(group = %self.id, field = %binding.form, error = %err, "form field could not be projected");
            }
        }
        fields
    }

    fn to_document_patch(&self, fields: &FlatFields) -> SettingsResult<Patch> {
        let mut roots = Map::new();
        for binding in &self.bindings {
            let value = fields
                .get_path(&binding.form)
                .ok_or_else(|| SettingsError::MissingField {
                    group: self.id,
                    field: binding.form.to_string(),
                })?;
            path::insert(&mut roots, &binding.document, value.clone())?;
        }

        let mut patch = Patch::new();
        for key in self.owned_keys {
            if let Some(value) = roots.remove(*key) {
                patch.push(*key, value);
            }
        }
        debug!(group = %self.id, keys = patch.len(), "built settings patch");
        Ok(patch)
    }
}

/// Builder for [`TableGroup`].
#[derive(Debug)]
pub struct TableGroupBuilder {
    id: GroupId,
    fetch_keys: &'static [&'static str],
    owned_keys: &'static [&'static str],
    fields: Vec<FieldSpec>,
    bindings: Vec<FieldBinding>,
}

impl TableGroupBuilder {
    /// Top-level keys fetched before the forward transform.
    #[must_use]
    pub fn fetch(mut self, keys: &'static [&'static str]) -> Self {
        self.fetch_keys = keys;
        self
    }

    /// Top-level keys written by the reverse transform, in write order.
    #[must_use]
    pub fn owns(mut self, keys: &'static [&'static str]) -> Self {
        self.owned_keys = keys;
        self
    }

    /// Declare a top-level form field bound to `document`.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec, document: &str) -> Self {
        self.bindings.push(FieldBinding {
            form: DocumentPath::new(spec.name()),
            document: DocumentPath::new(document),
        });
        self.fields.push(spec);
        self
    }

    /// Bind `<name>_<leaf>` form fields to `<parent>.<name>.<leaf>` for each leaf.
    #[must_use]
    pub fn block(
        mut self,
        parent: &str,
        name: &str,
        leaves: impl IntoIterator<Item = FieldSpec>,
    ) -> Self {
        for leaf in leaves {
            let document = format!("{parent}.{name}.{}", leaf.name());
            let form = format!("{name}_{}", leaf.name());
            self = self.field(leaf.renamed(form), &document);
        }
        self
    }

    /// Declare a schema field with no binding; the wrapping group maps it itself.
    #[must_use]
    pub fn unbound(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declare a nested form object whose members are each bound to a document path.
    #[must_use]
    pub fn object(mut self, spec: FieldSpec, documents: &[(&str, &str)]) -> Self {
        if let FieldKind::Object(members) = spec.kind() {
            for member in members {
                let Some((_, document)) = documents
                    .iter()
                    .find(|(name, _)| *name == member.name())
                else {
                    continue;
                };
                self.bindings.push(FieldBinding {
                    form: DocumentPath::new(&format!("{}.{}", spec.name(), member.name())),
                    document: DocumentPath::new(document),
                });
            }
        }
        self.fields.push(spec);
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> TableGroup {
        TableGroup {
            id: self.id,
            fetch_keys: self.fetch_keys,
            owned_keys: self.owned_keys,
            schema: FieldSchema::new(self.fields),
            bindings: self.bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TextRule;
    use serde_json::json;

    fn demo_group() -> TableGroup {
        TableGroup::builder(GroupId::MediaServer)
            .fetch(&["updaters", "debug"])
            .owns(&["debug", "updaters"])
            .field(FieldSpec::boolean("debug", true), "debug")
            .field(FieldSpec::integer("update_interval", 0, 120), "updaters.update_interval")
            .field(
                FieldSpec::required_text(
                    "plex_url",
                    TextRule::MinLength {
                        min: 1,
                        message: "String must contain at least 1 character(s)",
                    },
                ),
                "updaters.plex.url",
            )
            .build()
    }

    #[test]
    fn group_ids_round_trip_through_strings() -> anyhow::Result<()> {
        for id in GroupId::ALL {
            assert_eq!(id.as_str().parse::<GroupId>()?, id);
        }
        assert_eq!("mediaserver".parse::<GroupId>()?, GroupId::MediaServer);
        assert!("billing".parse::<GroupId>().is_err());
        Ok(())
    }

    #[test]
    fn forward_transform_defaults_missing_leaves_and_skips_required() {
        let fields = demo_group().to_form_model(&json!({"updaters": {}}));
        assert_eq!(
            fields.into_value(),
            json!({"debug": true, "update_interval": 120})
        );
    }

    #[test]
    fn forward_transform_tolerates_non_object_fragment() {
        let fields = demo_group().to_form_model(&json!("service down"));
        assert_eq!(fields.get("update_interval"), Some(&json!(120)));
    }

    #[test]
    fn reverse_transform_orders_owned_keys() -> anyhow::Result<()> {
        let fields = FlatFields::from_value(json!({
            "debug": false,
            "update_interval": 60,
            "plex_url": "http://plex:32400"
        }));
        let patch = demo_group().to_document_patch(&fields)?;
        assert_eq!(patch.keys().collect::<Vec<_>>(), vec!["debug", "updaters"]);
        assert_eq!(patch.get("debug"), Some(&json!(false)));
        assert_eq!(
            patch.get("updaters"),
            Some(&json!({"update_interval": 60, "plex": {"url": "http://plex:32400"}}))
        );
        Ok(())
    }

    #[test]
    fn reverse_transform_reports_missing_field() {
        let fields = FlatFields::from_value(json!({"debug": true, "update_interval": 1}));
        let err = demo_group().to_document_patch(&fields).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::MissingField { group: GroupId::MediaServer, ref field } if field == "plex_url"
        ));
    }

    #[test]
    fn submit_validates_before_transforming() {
        let err = demo_group()
            .submit(&json!({"update_interval": "-3", "plex_url": "x"}))
            .unwrap_err();
        let SettingsError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.message_for("update_interval"),
            Some("Number must be greater than or equal to 0")
        );
    }

    #[test]
    fn document_path_lookup_by_form_name() {
        let group = demo_group();
        assert_eq!(
            group.document_path("plex_url").map(ToString::to_string),
            Some("updaters.plex.url".to_string())
        );
    }
}

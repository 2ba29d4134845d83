//! Page controllers: load a settings form from the backend and submit edits back.
//!
//! # Design
//! - Loading never fails on stored data that violates the schema; the
//!   violations travel with the form instead.
//! - Submitting runs validate, reverse transform, apply, then persist and reload.
//!   The first failure stops the sequence and nothing is retried.

use std::collections::BTreeMap;

use riven_settings::groups::DEFAULT_AUTH_METHOD;
use riven_settings::{
    ApplicationRecord, ApplicationsGroup, FlatFields, GroupId, Patch, ServiceCatalog,
    SettingsGroup, ValidationErrors,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{PageError, PageResult};
use crate::gateway::{SettingsGateway, SharedGateway};
use crate::mirror::FileMirror;

/// Message reported after a successful submission.
pub const SAVED_MESSAGE: &str = "Settings saved!";

/// Patch keys the applications page sends; stored updaters stay untouched.
const APPLICATIONS_PAGE_KEYS: &[&str] = &["applications", "dossiers"];

/// Form ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedForm {
    /// Group the form belongs to.
    pub group: GroupId,
    /// Field values; validated and coerced when `errors` is empty.
    pub fields: FlatFields,
    /// Schema violations found in the stored values.
    pub errors: ValidationErrors,
}

impl LoadedForm {
    /// Whether the stored values satisfy the schema.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// Group that was saved.
    pub group: GroupId,
    /// Overwrites sent to the backend.
    pub patch: Patch,
    /// Confirmation shown to the user.
    pub message: &'static str,
}

fn validated(group: &dyn SettingsGroup, fields: FlatFields) -> LoadedForm {
    match group.schema().validate(&fields.clone().into_value()) {
        Ok(fields) => LoadedForm {
            group: group.id(),
            fields,
            errors: ValidationErrors::new(),
        },
        Err(errors) => {
            warn!(group = %group.id(), failures = errors.len(), "stored settings fail validation");
            LoadedForm {
                group: group.id(),
                fields,
                errors,
            }
        }
    }
}

async fn fetch(
    gateway: &dyn SettingsGateway,
    group: &dyn SettingsGroup,
    keys: &[&str],
) -> PageResult<Value> {
    gateway
        .fetch_fragment(keys)
        .await
        .map_err(|source| {
            warn!(group = %group.id(), error = %source, "settings fetch failed");
            PageError::Unavailable { source }
        })
}

async fn apply_and_save(gateway: &dyn SettingsGateway, patch: &Patch) -> PageResult<()> {
    let outcome = gateway
        .apply_patch(patch)
        .await
        .map_err(|source| PageError::SaveFailed { source })?;
    if !outcome.success {
        warn!(message = ?outcome.message, "backend rejected settings");
        return Err(PageError::Rejected {
            message: outcome.message,
        });
    }
    gateway
        .persist()
        .await
        .map_err(|source| PageError::SaveFailed { source })?;
    gateway
        .reload()
        .await
        .map_err(|source| PageError::SaveFailed { source })
}

/// Load and submit controller for one settings group.
#[derive(Clone)]
pub struct SettingsPage {
    group: &'static dyn SettingsGroup,
    gateway: SharedGateway,
}

impl SettingsPage {
    /// Controller for `id` talking to `gateway`.
    #[must_use]
    pub fn new(id: GroupId, gateway: SharedGateway) -> Self {
        Self {
            group: riven_settings::group(id),
            gateway,
        }
    }

    /// Group served by this page.
    #[must_use]
    pub fn group(&self) -> &'static dyn SettingsGroup {
        self.group
    }

    /// Fetch the group's keys and project them onto the form.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Unavailable`] when the backend cannot be reached.
    pub async fn load(&self) -> PageResult<LoadedForm> {
        let fragment = fetch(self.gateway.as_ref(), self.group, self.group.fetch_keys()).await?;
        Ok(validated(self.group, self.group.to_form_model(&fragment)))
    }

    /// Validate `input`, write it back, then persist and reload.
    ///
    /// Groups with merge keys fetch the stored values first so the patch keeps
    /// entries the form does not show.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Validation`] for invalid input, [`PageError::Rejected`]
    /// when the backend refuses the patch, and [`PageError::SaveFailed`] when a
    /// backend call fails in transit. Fetching merge keys fails with
    /// [`PageError::Unavailable`].
    pub async fn submit(&self, input: &Value) -> PageResult<SubmitOutcome> {
        let merge_keys = self.group.merge_keys();
        let patch = if merge_keys.is_empty() {
            self.group.submit(input)?
        } else {
            let stored = fetch(self.gateway.as_ref(), self.group, merge_keys).await?;
            self.group.submit_over(input, &stored)?
        };
        apply_and_save(self.gateway.as_ref(), &patch).await?;
        info!(group = %self.group.id(), keys = patch.len(), "settings saved");
        Ok(SubmitOutcome {
            group: self.group.id(),
            patch,
            message: SAVED_MESSAGE,
        })
    }
}

/// Applications form together with the installable services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationsForm {
    /// Applications form merged with the local mirror.
    pub form: LoadedForm,
    /// Services offered for installation.
    pub items: ServiceCatalog,
}

/// Posted applications form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationSubmission {
    /// Catalog id of the selected service; blank counts as `0`.
    pub id: Option<String>,
    /// Label of the selected service.
    pub label: String,
    /// Authentication method for the service.
    pub auth_method: Option<String>,
    /// Domain overrides keyed by label.
    pub domains: BTreeMap<String, String>,
}

impl ApplicationSubmission {
    /// Read the HTML form fields `selectedItemId`, `selectedItemLabel`,
    /// `authappli` and `domaine[<label>]`. Other fields are ignored.
    pub fn from_form_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "selectedItemId" => submission.id = Some(value.into()),
                "selectedItemLabel" => submission.label = value.into(),
                "authappli" => submission.auth_method = Some(value.into()),
                other => {
                    if let Some(label) = other
                        .strip_prefix("domaine[")
                        .and_then(|rest| rest.strip_suffix(']'))
                    {
                        submission.domains.insert(label.to_string(), value.into());
                    }
                }
            }
        }
        submission
    }

    fn id_value(&self) -> Value {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Value::from(0),
            Some(raw) => Value::String(raw.to_string()),
        }
    }

    fn auth_method(&self) -> &str {
        self.auth_method
            .as_deref()
            .filter(|method| !method.trim().is_empty())
            .unwrap_or(DEFAULT_AUTH_METHOD)
    }

    /// Domain overrides with blank values replaced by the label.
    fn resolved_domains(&self) -> BTreeMap<String, String> {
        self.domains
            .iter()
            .map(|(key, value)| {
                let domain = if value.trim().is_empty() {
                    self.label.clone()
                } else {
                    value.clone()
                };
                (key.clone(), domain)
            })
            .collect()
    }
}

/// Applications page: backend settings plus the local mirror and service catalog.
#[derive(Clone)]
pub struct ApplicationsPage {
    gateway: SharedGateway,
    mirror: FileMirror,
}

impl ApplicationsPage {
    /// Controller using `gateway` and `mirror`.
    #[must_use]
    pub const fn new(gateway: SharedGateway, mirror: FileMirror) -> Self {
        Self { gateway, mirror }
    }

    /// Load the form, overlay the mirror, and regenerate the service catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Unavailable`] when the backend cannot be reached and
    /// [`PageError::Mirror`] when a reset mirror cannot be written.
    pub async fn load(&self) -> PageResult<ApplicationsForm> {
        let group = riven_settings::applications();
        let fragment = fetch(self.gateway.as_ref(), group, group.fetch_keys()).await?;
        let mut fields = group.to_form_model(&fragment);

        let mirror = self.mirror.load_or_init().await?;
        fields.insert(
            "dossiers_on_item_type",
            Value::Array(
                mirror
                    .applications
                    .iter()
                    .map(|app| json!({"label": app.label}))
                    .collect(),
            ),
        );
        fields.insert("authentification", json!(mirror.authentification()));
        fields.insert("domaine", json!(mirror.dossiers.domaine));

        let items = self.mirror.generate_catalog().await;
        Ok(ApplicationsForm {
            form: validated(group, fields),
            items,
        })
    }

    /// Register the submitted application in the mirror and the backend.
    ///
    /// An application already stored under the same label is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Validation`] for a blank label or invalid values,
    /// [`PageError::Mirror`] when the mirror cannot be written, and the
    /// gateway errors of [`SettingsPage::submit`].
    pub async fn submit(&self, submission: &ApplicationSubmission) -> PageResult<SubmitOutcome> {
        let label = submission.label.trim();
        if label.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push("label", "Required");
            return Err(PageError::Validation(errors));
        }

        let mut mirror = self.mirror.load_or_init().await?;
        mirror
            .dossiers
            .register(label, submission.auth_method(), submission.resolved_domains());

        let group = riven_settings::applications();
        let fields = group.schema().validate(&json!({
            "id": submission.id_value(),
            "label": label,
            "dossiers_on_item_type": mirror
                .dossiers
                .on_item_type
                .iter()
                .map(|label| json!({"label": label}))
                .collect::<Vec<_>>(),
            "authentification": mirror.authentification(),
            "domaine": mirror.dossiers.domaine,
        }))?;
        let record = ApplicationsGroup::record_from(&fields)?;
        let existing: Vec<ApplicationRecord> = mirror
            .applications
            .iter()
            .filter(|app| app.label != record.label)
            .cloned()
            .collect();
        let patch: Patch = group
            .to_document_patch_with(&fields, &existing)?
            .into_iter()
            .filter(|entry| APPLICATIONS_PAGE_KEYS.contains(&entry.key.as_str()))
            .collect();

        mirror.applications = existing;
        mirror.applications.push(record);
        self.mirror.write(&mirror).await?;

        apply_and_save(self.gateway.as_ref(), &patch).await?;
        info!(label, "application registered");
        Ok(SubmitOutcome {
            group: GroupId::Applications,
            patch,
            message: SAVED_MESSAGE,
        })
    }
}

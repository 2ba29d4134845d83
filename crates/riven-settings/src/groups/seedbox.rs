//! Seedbox account, Cloudflare credentials and reverse-proxy authentication.
//!
//! # Design
//! - The form always opens on [`FORCED_AUTH_METHOD`], whatever is stored.
//!   The stored OAuth detail fields are still projected.
//! - On write, `traefik` keeps its OAuth detail fields only when the selected
//!   method is `oauth`; any other method emits `{authMethod}` alone.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::SettingsResult;
use crate::group::{GroupId, SettingsGroup, TableGroup};
use crate::patch::Patch;
use crate::path::DocumentPath;
use crate::schema::{AUTH_METHODS, FieldSchema, FieldSpec, FlatFields, TextRule};

/// Authentication method the form shows on load.
pub const FORCED_AUTH_METHOD: &str = "basique";

/// Method under which OAuth detail fields are kept on write.
pub const OAUTH_METHOD: &str = "oauth";

const FETCH_KEYS: &[&str] = &["cloudflare", "utilisateur"];
const OWNED_KEYS: &[&str] = &["utilisateur", "cloudflare"];
const OAUTH_FIELDS: [&str; 3] = ["oauth_client", "oauth_secret", "oauth_mail"];

/// Seedbox group: a table group plus the auth-method policies.
#[derive(Debug, Clone)]
pub struct SeedboxGroup {
    table: TableGroup,
}

impl SeedboxGroup {
    pub(super) fn new() -> Self {
        let traefik = FieldSpec::object(
            "traefik",
            vec![
                FieldSpec::choice("authMethod", AUTH_METHODS),
                FieldSpec::text("oauth_client", ""),
                FieldSpec::text("oauth_secret", ""),
                FieldSpec::text("oauth_mail", ""),
            ],
        )
        .with_default(json!({
            "authMethod": FORCED_AUTH_METHOD,
            "oauth_client": "",
            "oauth_secret": "",
            "oauth_mail": ""
        }));

        let table = TableGroup::builder(GroupId::Seedbox)
            .fetch(FETCH_KEYS)
            .owns(OWNED_KEYS)
            .field(
                FieldSpec::required_text(
                    "username",
                    TextRule::MinLength {
                        min: 1,
                        message: "Username is required",
                    },
                ),
                "utilisateur.username",
            )
            .field(
                FieldSpec::required_text(
                    "email",
                    TextRule::Email {
                        message: "Invalid email address",
                    },
                ),
                "utilisateur.email",
            )
            .field(
                FieldSpec::required_text(
                    "domain",
                    TextRule::Domain {
                        message: "Invalid domain format",
                    },
                ),
                "utilisateur.domain",
            )
            .field(
                FieldSpec::required_text(
                    "password",
                    TextRule::MinLength {
                        min: 8,
                        message: "Password must be at least 8 characters long",
                    },
                ),
                "utilisateur.password",
            )
            .field(
                FieldSpec::required_text(
                    "cloudflare_login",
                    TextRule::MinLength {
                        min: 1,
                        message: "Login is required",
                    },
                ),
                "cloudflare.cloudflare_login",
            )
            .field(
                FieldSpec::required_text(
                    "cloudflare_api_key",
                    TextRule::MinLength {
                        min: 1,
                        message: "API key is required",
                    },
                ),
                "cloudflare.cloudflare_api_key",
            )
            .object(
                traefik,
                &[
                    ("authMethod", "utilisateur.traefik.authMethod"),
                    ("oauth_client", "utilisateur.traefik.oauth_client"),
                    ("oauth_secret", "utilisateur.traefik.oauth_secret"),
                    ("oauth_mail", "utilisateur.traefik.oauth_mail"),
                ],
            )
            .field(FieldSpec::text("domainperso", "traefik"), "utilisateur.domainperso")
            .build();
        Self { table }
    }
}

impl SettingsGroup for SeedboxGroup {
    fn id(&self) -> GroupId {
        GroupId::Seedbox
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
        let mut fields = self.table.to_form_model(fragment);
        if let Err(err) = fields.insert_path(
            &DocumentPath::new("traefik.authMethod"),
            Value::String(FORCED_AUTH_METHOD.to_string()),
        ) {
            debug!(error = %err, "traefik block could not be reset to the baseline method");
        }
        fields
    }

    fn to_document_patch(&self, fields: &FlatFields) -> SettingsResult<Patch> {
        let mut patch = self.table.to_document_patch(fields)?;
        let traefik = patch
            .get_mut("utilisateur")
            .and_then(Value::as_object_mut)
            .and_then(|user| user.get_mut("traefik"))
            .and_then(Value::as_object_mut);
        if let Some(traefik) = traefik {
            let method = traefik.get("authMethod").and_then(Value::as_str);
            if method != Some(OAUTH_METHOD) {
                debug!(method = ?method, "dropping oauth detail fields");
                traefik.retain(|key, _| !OAUTH_FIELDS.contains(&key.as_str()));
            }
        }
        Ok(patch)
    }
}

//! Local mirror of the applications settings and the service catalog.
//!
//! # Design
//! - Every path derives from an explicit home directory.
//! - A missing `settings.json`, or one that is not JSON at all, is replaced by
//!   [`MirrorDocument::initial`]. Valid JSON of an unexpected shape is reported
//!   and left on disk.
//! - Stored authentication methods are read back in lower case.
//! - Catalog generation never fails the caller; problems are logged and an
//!   empty catalog is returned.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use riven_settings::groups::{APPLICATION_AUTH_KEY, DEFAULT_AUTH_METHOD};
use riven_settings::{ApplicationRecord, ServiceCatalog};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MirrorError, MirrorResult};

const SERVICES_AVAILABLE: &str = "seedbox-compose/includes/config/services-available";
const STATIC_DIR: &str = "projet-riven/riven-frontend/static";

/// Files the mirror reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPaths {
    /// Plain-text listing of installable services.
    pub services_available: PathBuf,
    /// Applications mirror document.
    pub settings: PathBuf,
    /// Generated catalog consumed by the frontend.
    pub services: PathBuf,
}

impl MirrorPaths {
    /// Standard layout under `home`.
    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        let static_dir = home.join(STATIC_DIR);
        Self {
            services_available: home.join(SERVICES_AVAILABLE),
            settings: static_dir.join("settings.json"),
            services: static_dir.join("services.json"),
        }
    }
}

/// Per-label folder data kept in the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorDossiers {
    /// Labels of the installed applications.
    #[serde(default)]
    pub on_item_type: Vec<String>,
    /// Authentication method per label, plus the application-wide `authappli` entry.
    #[serde(default)]
    pub authentification: BTreeMap<String, Option<String>>,
    /// Domain per label; `null` entries are kept.
    #[serde(default)]
    pub domaine: BTreeMap<String, Option<String>>,
}

impl MirrorDossiers {
    /// Record `label` with its authentication method and merge `domains`.
    pub fn register(&mut self, label: &str, auth_method: &str, domains: BTreeMap<String, String>) {
        if !self.on_item_type.iter().any(|known| known == label) {
            self.on_item_type.push(label.to_string());
        }
        self.authentification
            .insert(label.to_string(), Some(auth_method.to_string()));
        self.domaine
            .extend(domains.into_iter().map(|(label, domain)| (label, Some(domain))));
    }

    fn normalize_auth(&mut self) {
        for method in self.authentification.values_mut().flatten() {
            *method = method.trim().to_ascii_lowercase();
        }
    }
}

/// Contents of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorDocument {
    /// Installed applications.
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
    /// Per-label folder data.
    #[serde(default)]
    pub dossiers: MirrorDossiers,
    /// Updater block kept alongside the applications; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updaters: Option<Value>,
}

impl MirrorDocument {
    /// Document written when no usable mirror exists.
    #[must_use]
    pub fn initial() -> Self {
        let mut authentification = BTreeMap::new();
        authentification.insert(
            APPLICATION_AUTH_KEY.to_string(),
            Some(DEFAULT_AUTH_METHOD.to_string()),
        );
        Self {
            applications: Vec::new(),
            dossiers: MirrorDossiers {
                on_item_type: Vec::new(),
                authentification,
                domaine: BTreeMap::new(),
            },
            updaters: None,
        }
    }

    /// Authentication map with blank or `null` methods set to the default and
    /// the `authappli` entry guaranteed.
    #[must_use]
    pub fn authentification(&self) -> BTreeMap<String, String> {
        let mut methods: BTreeMap<String, String> = self
            .dossiers
            .authentification
            .iter()
            .map(|(label, method)| {
                let method = method
                    .as_deref()
                    .filter(|method| !method.is_empty())
                    .unwrap_or(DEFAULT_AUTH_METHOD);
                (label.clone(), method.to_string())
            })
            .collect();
        methods
            .entry(APPLICATION_AUTH_KEY.to_string())
            .or_insert_with(|| DEFAULT_AUTH_METHOD.to_string());
        methods
    }
}

/// Reader and writer for the mirror files.
#[derive(Debug, Clone)]
pub struct FileMirror {
    paths: MirrorPaths,
}

impl FileMirror {
    /// Mirror over `paths`.
    #[must_use]
    pub const fn new(paths: MirrorPaths) -> Self {
        Self { paths }
    }

    /// Mirror using the standard layout under `home`.
    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        Self::new(MirrorPaths::from_home(home))
    }

    /// Files this mirror uses.
    #[must_use]
    pub const fn paths(&self) -> &MirrorPaths {
        &self.paths
    }

    /// Read `settings.json`, resetting it when unreadable or not JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the file holds JSON that does not describe a
    /// mirror document, or when the reset document cannot be written.
    pub async fn load_or_init(&self) -> MirrorResult<MirrorDocument> {
        let path = &self.paths.settings;
        let parsed = match fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str::<Value>(&raw).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        let value = match parsed {
            Ok(value) => value,
            Err(reason) => {
                warn!(path = %path.display(), error = %reason, "settings mirror unusable, resetting");
                let document = MirrorDocument::initial();
                self.write(&document).await?;
                return Ok(document);
            }
        };

        let mut document =
            MirrorDocument::deserialize(&value).map_err(|source| MirrorError::Json {
                operation: "decode_settings",
                path: path.clone(),
                source,
            })?;
        document.dossiers.normalize_auth();
        debug!(path = %path.display(), "loaded settings mirror");
        Ok(document)
    }

    /// Write `document` to `settings.json` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or writing fails.
    pub async fn write(&self, document: &MirrorDocument) -> MirrorResult<()> {
        write_json(&self.paths.settings, document, "write_settings").await
    }

    /// Build the service catalog from the listing and write `services.json`.
    ///
    /// Failures are logged and produce an empty catalog.
    pub async fn generate_catalog(&self) -> ServiceCatalog {
        match self.try_generate_catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "service catalog generation failed");
                ServiceCatalog::default()
            }
        }
    }

    async fn try_generate_catalog(&self) -> MirrorResult<ServiceCatalog> {
        let source = &self.paths.services_available;
        let listing = fs::read_to_string(source)
            .await
            .map_err(|err| io_error("read_services_available", source, err))?;
        let catalog = ServiceCatalog::parse(&listing);
        write_json(&self.paths.services, &catalog, "write_services").await?;
        debug!(items = catalog.items.len(), "generated service catalog");
        Ok(catalog)
    }
}

async fn write_json<T: Serialize + Sync>(
    path: &Path,
    value: &T,
    operation: &'static str,
) -> MirrorResult<()> {
    let encoded = serde_json::to_string_pretty(value).map_err(|source| MirrorError::Json {
        operation,
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| io_error(operation, parent, err))?;
    }
    fs::write(path, encoded)
        .await
        .map_err(|err| io_error(operation, path, err))
}

fn io_error(operation: &'static str, path: &Path, source: io::Error) -> MirrorError {
    MirrorError::Io {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riven_test_support::fixtures::SERVICES_AVAILABLE as LISTING;
    use riven_test_support::home::TestHome;
    use serde_json::json;

    #[tokio::test]
    async fn missing_mirror_is_initialised() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        let mirror = FileMirror::from_home(home.path());
        let document = mirror.load_or_init().await?;
        assert_eq!(document, MirrorDocument::initial());
        assert_eq!(
            home.read_static_json("settings.json")?,
            json!({
                "applications": [],
                "dossiers": {
                    "on_item_type": [],
                    "authentification": {"authappli": "basique"},
                    "domaine": {}
                }
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_mirror_is_reset() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        home.write_static("settings.json", "{not json")?;
        let document = FileMirror::from_home(home.path()).load_or_init().await?;
        assert_eq!(document, MirrorDocument::initial());
        Ok(())
    }

    #[tokio::test]
    async fn existing_mirror_accepts_numeric_ids() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        home.write_static(
            "settings.json",
            r#"{"applications": [{"id": 2, "label": "radarr"}], "dossiers": {"on_item_type": ["radarr"]}}"#,
        )?;
        let document = FileMirror::from_home(home.path()).load_or_init().await?;
        assert_eq!(document.applications[0].id, "2");
        assert_eq!(document.dossiers.on_item_type, vec!["radarr".to_string()]);
        assert_eq!(
            document.authentification().get(APPLICATION_AUTH_KEY).map(String::as_str),
            Some("basique")
        );
        Ok(())
    }

    #[tokio::test]
    async fn loose_mirror_survives_loading() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        let stored = json!({
            "applications": [{"id": "1", "label": "sonarr"}, {"label": "radarr"}],
            "dossiers": {
                "on_item_type": ["sonarr", "radarr"],
                "authentification": {"authappli": "basique", "radarr": null},
                "domaine": {"sonarr": null}
            }
        });
        home.write_static("settings.json", &stored.to_string())?;

        let document = FileMirror::from_home(home.path()).load_or_init().await?;
        assert_eq!(document.applications.len(), 2);
        assert_eq!(document.applications[1].id, "");
        assert_eq!(document.dossiers.domaine.get("sonarr"), Some(&None));
        assert_eq!(
            document.authentification().get("radarr").map(String::as_str),
            Some("basique")
        );
        assert_eq!(home.read_static_json("settings.json")?, stored);
        Ok(())
    }

    #[tokio::test]
    async fn unexpected_shape_is_reported_and_left_alone() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        home.write_static("settings.json", r#"{"applications": "sonarr"}"#)?;
        let err = FileMirror::from_home(home.path())
            .load_or_init()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Json { operation: "decode_settings", .. }
        ));
        assert_eq!(
            home.read_static_json("settings.json")?,
            json!({"applications": "sonarr"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn stored_auth_methods_are_lowercased() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        home.write_static(
            "settings.json",
            r#"{"applications": [], "dossiers": {"authentification": {"sonarr": " Basique"}}}"#,
        )?;
        let document = FileMirror::from_home(home.path()).load_or_init().await?;
        assert_eq!(
            document.authentification().get("sonarr").map(String::as_str),
            Some("basique")
        );
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_keeps_updaters_block() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        home.write_static(
            "settings.json",
            r#"{"applications": [], "dossiers": {}, "updaters": {"plex": {"token": "tok"}}}"#,
        )?;
        let mirror = FileMirror::from_home(home.path());
        let mut document = mirror.load_or_init().await?;
        document.dossiers.register("plex", "basique", BTreeMap::new());
        mirror.write(&document).await?;
        assert_eq!(
            home.read_static_json("settings.json")?["updaters"],
            json!({"plex": {"token": "tok"}})
        );
        Ok(())
    }

    #[tokio::test]
    async fn catalog_is_written_next_to_frontend_assets() -> anyhow::Result<()> {
        let home = TestHome::with_services(LISTING)?;
        let catalog = FileMirror::from_home(home.path()).generate_catalog().await;
        assert_eq!(catalog.items.len(), 3);
        assert_eq!(
            home.read_static_json("services.json")?,
            json!({"items": [
                {"id": 0, "label": "sonarr"},
                {"id": 1, "label": "radarr"},
                {"id": 2, "label": "lidarr"}
            ]})
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_listing_yields_empty_catalog() -> anyhow::Result<()> {
        let home = TestHome::new()?;
        let catalog = FileMirror::from_home(home.path()).generate_catalog().await;
        assert!(catalog.items.is_empty());
        assert!(!home.static_file("services.json").exists());
        Ok(())
    }

    #[test]
    fn register_merges_without_duplicating_labels() {
        let mut dossiers = MirrorDocument::initial().dossiers;
        let mut domains = BTreeMap::new();
        domains.insert("sonarr".to_string(), "tv.example.com".to_string());
        dossiers.register("sonarr", "oauth", domains);
        dossiers.register("sonarr", "basique", BTreeMap::new());
        assert_eq!(dossiers.on_item_type, vec!["sonarr".to_string()]);
        assert_eq!(
            dossiers.authentification.get("sonarr").and_then(Option::as_deref),
            Some("basique")
        );
        assert_eq!(
            dossiers.domaine.get("sonarr").and_then(Option::as_deref),
            Some("tv.example.com")
        );
    }
}

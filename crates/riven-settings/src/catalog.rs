//! Service catalog parsed from a `services-available` listing.

use serde::{Deserialize, Serialize};

/// One selectable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Position among the non-blank lines of the listing.
    pub id: usize,
    /// Service name (first word of the line).
    pub label: String,
}

/// Catalog document written next to the frontend assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    /// Services in listing order.
    pub items: Vec<ServiceItem>,
}

impl ServiceCatalog {
    /// Catalog for `listing`.
    #[must_use]
    pub fn parse(listing: &str) -> Self {
        Self {
            items: parse_service_listing(listing),
        }
    }

    /// Whether `label` is offered.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.items.iter().any(|item| item.label == label)
    }
}

/// Take the first whitespace-delimited word of every non-blank line.
#[must_use]
pub fn parse_service_listing(listing: &str) -> Vec<ServiceItem> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .enumerate()
        .map(|(id, label)| ServiceItem {
            id,
            label: label.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_do_not_consume_ids() {
        let items = parse_service_listing("sonarr  -  tv\n\n   \nradarr movies\r\n  lidarr\n");
        let labels: Vec<(usize, &str)> = items
            .iter()
            .map(|item| (item.id, item.label.as_str()))
            .collect();
        assert_eq!(labels, vec![(0, "sonarr"), (1, "radarr"), (2, "lidarr")]);
    }

    #[test]
    fn catalog_serialises_under_items() -> anyhow::Result<()> {
        let catalog = ServiceCatalog::parse("plex\n");
        assert!(catalog.contains("plex"));
        assert_eq!(
            serde_json::to_value(&catalog)?,
            serde_json::json!({"items": [{"id": 0, "label": "plex"}]})
        );
        Ok(())
    }
}

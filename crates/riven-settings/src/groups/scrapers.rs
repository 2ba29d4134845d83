//! Scraper integrations and result-count thresholds.
//!
//! Every provider block lives under `scraping.<provider>`; the form flattens
//! each leaf into `<provider>_<leaf>`.

use crate::group::{GroupId, TableGroup};
use crate::schema::FieldSpec;

const KEYS: &[&str] = &["scraping"];

/// Default torrentio/knightcrawler stream filter.
pub const DEFAULT_STREAM_FILTER: &str = "sort=qualitysize%7Cqualityfilter=480p,scr,cam,unknown";

pub(super) fn table() -> TableGroup {
    TableGroup::builder(GroupId::Scrapers)
        .fetch(KEYS)
        .owns(KEYS)
        .field(FieldSpec::decimal("after_2", 0.0, 0.5), "scraping.after_2")
        .field(FieldSpec::integer("after_5", 0, 2), "scraping.after_5")
        .field(FieldSpec::integer("after_10", 0, 24), "scraping.after_10")
        .block(
            "scraping",
            "torrentio",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "https://torrentio.strem.fun"),
                FieldSpec::integer("timeout", 0, 30),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::text("filter", DEFAULT_STREAM_FILTER),
            ],
        )
        .block(
            "scraping",
            "knightcrawler",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "https://knightcrawler.elfhosted.com/"),
                FieldSpec::integer("timeout", 0, 30),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::text("filter", DEFAULT_STREAM_FILTER),
            ],
        )
        .block(
            "scraping",
            "annatar",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "https://annatar.elfhosted.com"),
                FieldSpec::integer("timeout", 0, 10),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::integer("limit", 0, 2000),
            ],
        )
        .block(
            "scraping",
            "orionoid",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("timeout", 0, 10),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::integer("limitcount", 0, 5),
            ],
        )
        .block(
            "scraping",
            "jackett",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "http://localhost:9117"),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("timeout", 0, 10),
                FieldSpec::boolean("ratelimit", true),
            ],
        )
        .block(
            "scraping",
            "mediafusion",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "https://mediafusion.elfhosted.com"),
                FieldSpec::integer("timeout", 0, 10),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::text_list("catalogs"),
            ],
        )
        .block(
            "scraping",
            "prowlarr",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "http://localhost:9696"),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("timeout", 0, 10),
                FieldSpec::boolean("ratelimit", true),
                FieldSpec::integer("limiter_seconds", 0, 60),
            ],
        )
        .block(
            "scraping",
            "torbox_scraper",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::integer("timeout", 0, 30),
                FieldSpec::boolean("ratelimit", true),
            ],
        )
        .block(
            "scraping",
            "zilean",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "http://localhost:8181"),
                FieldSpec::integer("timeout", 0, 30),
                FieldSpec::boolean("ratelimit", true),
            ],
        )
        .block(
            "scraping",
            "comet",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", "http://localhost:8000"),
                FieldSpec::text_list("indexers"),
                FieldSpec::integer("timeout", 0, 30),
                FieldSpec::boolean("ratelimit", true),
            ],
        )
        .build()
}

//! Content list sources (request managers, curated lists, watchlists).

use crate::group::{GroupId, TableGroup};
use crate::schema::FieldSpec;

const KEYS: &[&str] = &["content"];

pub(super) fn table() -> TableGroup {
    TableGroup::builder(GroupId::Content)
        .fetch(KEYS)
        .owns(KEYS)
        .block(
            "content",
            "overseerr",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("url", ""),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("update_interval", 0, 30),
                FieldSpec::boolean("use_webhook", false),
            ],
        )
        .block(
            "content",
            "mdblist",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("update_interval", 0, 300),
                FieldSpec::text_list("lists"),
            ],
        )
        .block(
            "content",
            "plex_watchlist",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text_list("rss"),
                FieldSpec::integer("update_interval", 0, 60),
            ],
        )
        .block(
            "content",
            "listrr",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("update_interval", 0, 300),
                FieldSpec::text_list("movie_lists"),
                FieldSpec::text_list("show_lists"),
            ],
        )
        .block(
            "content",
            "trakt",
            [
                FieldSpec::boolean("enabled", false),
                FieldSpec::text("api_key", ""),
                FieldSpec::integer("update_interval", 0, 300),
                FieldSpec::text_list("watchlist"),
                FieldSpec::text_list("user_lists"),
                FieldSpec::text_list("collection"),
                FieldSpec::boolean("fetch_trending", false),
                FieldSpec::boolean("fetch_popular", false),
                FieldSpec::integer("trending_count", 0, 10),
                FieldSpec::integer("popular_count", 0, 10),
            ],
        )
        .build()
}

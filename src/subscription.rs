//! Parses one subscription list file into filters plus display
//! metadata, following uBO/ABP list conventions.

use std::path::Path;
use std::sync::Arc;

use log::warn;

use crate::error::{FilterCoreError, Result};
use crate::filter::Filter;
use crate::parser::FilterParser;
use crate::resources::ResourceStore;

#[derive(Debug, Clone)]
pub struct Subscription {
    pub name: String,
    pub file_path: String,
    pub source_url: Option<String>,
    pub enabled: bool,
    pub last_update: i64,
    pub next_update: Option<i64>,
    pub filters: Vec<Arc<Filter>>,
}

impl Subscription {
    /// Reads and parses the subscription file at `path`, using
    /// `resources` to resolve any scriptlet bodies referenced by
    /// `+js(...)` rules. `now` is the current unix timestamp, used to
    /// compute `next_update` from a `! Expires: N days` header and as
    /// the fallback `last_update` when the caller has none on record.
    pub fn load(path: &Path, resources: &ResourceStore, now: i64) -> Result<Subscription> {
        let text = std::fs::read_to_string(path).map_err(|source| FilterCoreError::SubscriptionIo {
            path: path.to_path_buf(),
            source,
        })?;

        let parser = FilterParser::new(resources);
        let logical_lines =
            FilterParser::join_continuations(text.lines().map(|l| l.to_string()));

        let mut name = String::new();
        let mut expires_days: Option<i64> = None;
        let mut filters = Vec::new();

        for line in logical_lines {
            let trimmed = line.trim();
            if trimmed.starts_with('!') {
                if name.is_empty() {
                    if let Some(rest) = trimmed.strip_prefix("! Title:") {
                        name = rest.trim().to_string();
                    }
                }
                if let Some(rest) = trimmed.strip_prefix("! Expires:") {
                    if let Some(day_idx) = rest.find(" day") {
                        if let Ok(n) = rest[..day_idx].trim().parse::<i64>() {
                            if n > 0 {
                                expires_days = Some(n);
                            }
                        }
                    }
                }
                continue;
            }
            if trimmed.is_empty() || trimmed == "#" || trimmed.starts_with("# ") || trimmed.starts_with("[Adblock") {
                continue;
            }
            let filter = parser.parse_rule(trimmed);
            if matches!(filter.category, crate::types::FilterCategory::NotImplemented) {
                warn!("unrecognized or unsupported filter rule: {trimmed}");
            }
            filters.push(Arc::new(filter));
        }

        if name.is_empty() {
            name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
        }

        let next_update = expires_days.map(|days| now + days * 86_400);

        Ok(Subscription {
            name,
            file_path: path.to_string_lossy().to_string(),
            source_url: None,
            enabled: true,
            last_update: now,
            next_update,
            filters,
        })
    }
}

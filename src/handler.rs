//! Resolves block/allow/redirect decisions for network requests and
//! maintains hit counters and the decision log.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::container::FilterContainer;
use crate::domain::{host_of, is_third_party};
use crate::log::Log;
use crate::types::{Decision, ElementType, LogAction};

/// Schemes the original whitelists unconditionally before consulting
/// any filter (spec.md §4.7 / original `isSchemeWhitelisted`).
const WHITELISTED_SCHEMES: &[&str] = &["file", "qrc", "blocked", "filtercore"];

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub first_party_url: String,
    pub request_url: String,
    pub type_mask: ElementType,
}

impl RequestContext {
    pub fn new(first_party_url: impl Into<String>, request_url: impl Into<String>, mut type_mask: ElementType) -> Self {
        let first_party_url = first_party_url.into();
        let request_url = request_url.into();
        let request_host = host_of(&request_url);
        let first_party_host = host_of(&first_party_url);
        if is_third_party(&first_party_host, &request_host) {
            type_mask |= ElementType::THIRD_PARTY;
        }
        if request_url.starts_with("ws:") || request_url.starts_with("wss:") {
            type_mask |= ElementType::WEBSOCKET;
        }
        Self { first_party_url, request_url, type_mask }
    }
}

pub struct RequestHandler {
    requests_blocked_total: AtomicU64,
    page_ad_count: AtomicU64,
}

impl Default for RequestHandler {
    fn default() -> Self {
        Self {
            requests_blocked_total: AtomicU64::new(0),
            page_ad_count: AtomicU64::new(0),
        }
    }
}

impl RequestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total_blocked(total: u64) -> Self {
        Self {
            requests_blocked_total: AtomicU64::new(total),
            page_ad_count: AtomicU64::new(0),
        }
    }

    pub fn load_started(&self) {
        self.page_ad_count.store(0, Ordering::Relaxed);
    }

    pub fn num_ads_blocked_on_page(&self) -> u64 {
        self.page_ad_count.load(Ordering::Relaxed)
    }

    pub fn total_requests_blocked(&self) -> u64 {
        self.requests_blocked_total.load(Ordering::Relaxed)
    }

    /// Resolves a decision for `ctx`, consulting `container` in the
    /// priority order from spec.md §4.7, and appends a log entry for
    /// every non-allow outcome.
    pub fn should_block(&self, container: &mut FilterContainer, log: &mut Log, ctx: &RequestContext, now: i64) -> Decision {
        if let Some(scheme) = ctx.request_url.split(':').next() {
            if WHITELISTED_SCHEMES.contains(&scheme) {
                return Decision::Allow;
            }
        }

        let base_domain = host_of(&ctx.first_party_url);
        let request_domain = host_of(&ctx.request_url);

        if let Some(filter) = container.find_important_blocking_filter(&base_domain, &ctx.request_url, &request_domain, ctx.type_mask) {
            return self.finalize(&filter, container, log, ctx, now);
        }

        let candidate = match container.find_blocking_request_filter(&base_domain, &ctx.request_url, &request_domain, ctx.type_mask) {
            Some(f) => f,
            None => return Decision::Allow,
        };

        if container
            .find_whitelisting_filter(&base_domain, &ctx.request_url, &request_domain, ctx.type_mask)
            .is_some()
        {
            log.add_entry(LogAction::Allow, &ctx.first_party_url, &ctx.request_url, ctx.type_mask, &candidate.rule_string, now);
            return Decision::Allow;
        }

        self.finalize(&candidate, container, log, ctx, now)
    }

    fn finalize(
        &self,
        filter: &std::sync::Arc<crate::filter::Filter>,
        _container: &mut FilterContainer,
        log: &mut Log,
        ctx: &RequestContext,
        now: i64,
    ) -> Decision {
        self.requests_blocked_total.fetch_add(1, Ordering::Relaxed);
        self.page_ad_count.fetch_add(1, Ordering::Relaxed);

        if filter.redirect {
            let name = filter.redirect_name.clone().unwrap_or_default();
            log.add_entry(LogAction::Redirect, &ctx.first_party_url, &ctx.request_url, ctx.type_mask, &filter.rule_string, now);
            Decision::Redirect(name)
        } else {
            log.add_entry(LogAction::Block, &ctx.first_party_url, &ctx.request_url, ctx.type_mask, &filter.rule_string, now);
            Decision::Block
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FilterParser;
    use crate::resources::ResourceStore;
    use crate::subscription::Subscription;
    use std::sync::Arc;

    fn container_from(rules: &[&str]) -> FilterContainer {
        let resources = ResourceStore::new();
        let parser = FilterParser::new(&resources);
        let filters: Vec<Arc<crate::filter::Filter>> =
            rules.iter().map(|r| Arc::new(parser.parse_rule(r))).collect();
        let sub = Subscription {
            name: "t".into(),
            file_path: "t.txt".into(),
            source_url: None,
            enabled: true,
            last_update: 0,
            next_update: None,
            filters,
        };
        FilterContainer::build(&[sub])
    }

    #[test]
    fn blocks_matching_request_with_type_gate() {
        let mut container = container_from(&[
            "|https://$image,media,script,third-party,domain=watchvid.com",
        ]);
        let mut log = Log::new();
        let handler = RequestHandler::new();
        let ctx = RequestContext::new(
            "https://www.watchvid.com/watch?id=123456",
            "https://subdomain.mycdn.com/videos/thumbnails/5.jpg",
            ElementType::IMAGE,
        );
        let decision = handler.should_block(&mut container, &mut log, &ctx, 0);
        assert_eq!(decision, Decision::Block);
    }

    #[test]
    fn exception_overrides_block() {
        let mut container = container_from(&[
            "|https://$image,media,script,third-party,domain=watchvid.com",
            "@@||mycdn.com^$image,media,object,stylesheet,domain=watchvid.com",
        ]);
        let mut log = Log::new();
        let handler = RequestHandler::new();
        let ctx = RequestContext::new(
            "https://www.watchvid.com/watch?id=123456",
            "https://subdomain.mycdn.com/videos/thumbnails/5.jpg",
            ElementType::IMAGE,
        );
        let decision = handler.should_block(&mut container, &mut log, &ctx, 0);
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn redirect_decision_names_the_resource() {
        let mut container = container_from(&[
            "||google-analytics.com/ga.js$script,redirect=google-analytics.com/ga.js",
        ]);
        let mut log = Log::new();
        let handler = RequestHandler::new();
        let ctx = RequestContext::new(
            "https://example.com/",
            "https://ssl.google-analytics.com/ga.js",
            ElementType::SCRIPT,
        );
        let decision = handler.should_block(&mut container, &mut log, &ctx, 0);
        assert_eq!(decision, Decision::Redirect("google-analytics.com/ga.js".to_string()));
    }

    #[test]
    fn whitelisted_scheme_always_allowed() {
        let mut container = container_from(&["||anything.com^"]);
        let mut log = Log::new();
        let handler = RequestHandler::new();
        let ctx = RequestContext::new("https://a.com", "file:///etc/passwd", ElementType::OTHER);
        assert_eq!(handler.should_block(&mut container, &mut log, &ctx, 0), Decision::Allow);
    }

    #[test]
    fn unmatched_request_is_allowed() {
        let mut container = container_from(&["||doubleclick.net^"]);
        let mut log = Log::new();
        let handler = RequestHandler::new();
        let ctx = RequestContext::new("https://a.com", "https://example.com/index.html", ElementType::DOCUMENT);
        assert_eq!(handler.should_block(&mut container, &mut log, &ctx, 0), Decision::Allow);
    }
}

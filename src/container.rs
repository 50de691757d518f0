//! Indexes parsed filters into category-specific containers for fast
//! lookup, and pre-builds the global element-hiding stylesheet.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::domain::second_level_domain;
use crate::filter::Filter;
use crate::subscription::Subscription;
use crate::types::ElementType;

const MAX_SELECTORS_PER_RULE: usize = 1000;

#[derive(Default)]
pub struct FilterContainer {
    important_block: VecDeque<Arc<Filter>>,
    block_by_domain: HashMap<String, VecDeque<Arc<Filter>>>,
    block_by_pattern: VecDeque<Arc<Filter>>,
    block_other: VecDeque<Arc<Filter>>,
    allow: Vec<Arc<Filter>>,
    generic_hide: Vec<Arc<Filter>>,
    csp: Vec<Arc<Filter>>,
    domain_style: Vec<Arc<Filter>>,
    custom_style: Vec<Arc<Filter>>,
    domain_js: Vec<Arc<Filter>>,
    pub global_stylesheet: String,
}

impl FilterContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the whole container from the given subscriptions'
    /// filters. Disabled subscriptions contribute no filters.
    pub fn build(subscriptions: &[Subscription]) -> Self {
        let mut container = FilterContainer::new();
        let mut stylesheet_block: HashMap<String, Arc<Filter>> = HashMap::new();
        let mut stylesheet_exceptions: Vec<Arc<Filter>> = Vec::new();
        let mut bad_filter_rule_strings: HashSet<String> = HashSet::new();

        let all_filters: Vec<Arc<Filter>> = subscriptions
            .iter()
            .filter(|s| s.enabled)
            .flat_map(|s| s.filters.iter().cloned())
            .collect();

        for f in &all_filters {
            if f.blocked_types.contains(ElementType::BAD_FILTER) {
                bad_filter_rule_strings.insert(f.rule_string.clone());
            }
        }

        for f in all_filters {
            if bad_filter_rule_strings.contains(&f.rule_string) {
                continue;
            }
            use crate::types::FilterCategory::*;
            match f.category {
                Stylesheet => {
                    if f.exception {
                        stylesheet_exceptions.push(f.clone());
                    } else {
                        stylesheet_block.insert(f.eval_string.clone(), f.clone());
                    }
                }
                StylesheetJS => container.domain_js.push(f.clone()),
                StylesheetCustom => container.custom_style.push(f.clone()),
                _ => {
                    if f.blocked_types.contains(ElementType::CSP) && !f.blocked_types.contains(ElementType::POPUP) && !f.exception {
                        container.csp.push(f.clone());
                        continue;
                    }
                    if f.exception {
                        if f.blocked_types.contains(ElementType::GENERIC_HIDE) {
                            container.generic_hide.push(f.clone());
                        } else {
                            container.allow.push(f.clone());
                        }
                        continue;
                    }
                    if f.important {
                        container.important_block.push_back(f.clone());
                        continue;
                    }
                    match f.category {
                        StringContains => container.block_by_pattern.push_back(f.clone()),
                        Domain => {
                            let key = second_level_domain(&f.eval_string);
                            container
                                .block_by_domain
                                .entry(key)
                                .or_default()
                                .push_back(f.clone());
                        }
                        _ => container.block_other.push_back(f.clone()),
                    }
                }
            }
        }

        for exc in &stylesheet_exceptions {
            if let Some(blocking) = stylesheet_block.get_mut(&exc.eval_string) {
                let merged = Arc::make_mut(blocking);
                for d in &exc.domain_blacklist {
                    merged.domain_whitelist.insert(d.clone());
                }
            }
        }

        container.domain_style = stylesheet_block
            .values()
            .filter(|f| f.has_domain_rules())
            .cloned()
            .collect();

        container.global_stylesheet = build_global_stylesheet(stylesheet_block.values());

        container
    }

    fn scan_mtf(list: &mut VecDeque<Arc<Filter>>, base_domain: &str, url: &str, domain: &str, mask: ElementType) -> Option<Arc<Filter>> {
        let pos = list.iter().position(|f| f.is_match(base_domain, url, domain, mask))?;
        let found = list.remove(pos).unwrap();
        list.push_front(found.clone());
        Some(found)
    }

    pub fn find_important_blocking_filter(&mut self, base_domain: &str, url: &str, domain: &str, mask: ElementType) -> Option<Arc<Filter>> {
        Self::scan_mtf(&mut self.important_block, base_domain, url, domain, mask)
    }

    pub fn find_blocking_request_filter(&mut self, base_domain: &str, url: &str, domain: &str, mask: ElementType) -> Option<Arc<Filter>> {
        let second_level = second_level_domain(domain);
        if let Some(list) = self.block_by_domain.get_mut(&second_level) {
            if let Some(f) = Self::scan_mtf(list, base_domain, url, domain, mask) {
                return Some(f);
            }
        }
        if let Some(f) = Self::scan_mtf(&mut self.block_other, base_domain, url, domain, mask) {
            return Some(f);
        }
        Self::scan_mtf(&mut self.block_by_pattern, base_domain, url, domain, mask)
    }

    pub fn find_whitelisting_filter(&self, base_domain: &str, url: &str, domain: &str, mask: ElementType) -> Option<&Arc<Filter>> {
        self.allow.iter().find(|f| f.is_match(base_domain, url, domain, mask))
    }

    pub fn find_inline_script_blocking_filter(&mut self, base_domain: &str, url: &str, domain: &str) -> Option<Arc<Filter>> {
        let mask = ElementType::INLINE_SCRIPT;
        if let Some(f) = Self::scan_mtf(&mut self.important_block, base_domain, url, domain, mask) {
            return Some(f);
        }
        let second_level = second_level_domain(domain);
        if let Some(list) = self.block_by_domain.get_mut(&second_level) {
            if let Some(f) = Self::scan_mtf(list, base_domain, url, domain, mask) {
                return Some(f);
            }
        }
        if let Some(f) = Self::scan_mtf(&mut self.block_other, base_domain, url, domain, mask) {
            return Some(f);
        }
        Self::scan_mtf(&mut self.block_by_pattern, base_domain, url, domain, mask)
    }

    pub fn has_generic_hide_filter(&self, base_domain: &str, url: &str, domain: &str) -> bool {
        self.generic_hide
            .iter()
            .any(|f| f.is_match(base_domain, url, domain, ElementType::GENERIC_HIDE))
    }

    pub fn matching_csp_filters(&self, base_domain: &str, url: &str, domain: &str) -> Vec<&Arc<Filter>> {
        self.csp
            .iter()
            .filter(|f| f.is_match(base_domain, url, domain, ElementType::CSP))
            .collect()
    }

    pub fn domain_based_hiding_filters(&self, domain: &str) -> Vec<&Arc<Filter>> {
        self.domain_style
            .iter()
            .filter(|f| {
                crate::domain::domain_style_match(domain, &f.domain_blacklist, &f.domain_whitelist)
            })
            .collect()
    }

    pub fn domain_based_custom_hiding_filters(&self, domain: &str) -> Vec<&Arc<Filter>> {
        self.custom_style
            .iter()
            .filter(|f| {
                !f.has_domain_rules()
                    || crate::domain::domain_style_match(domain, &f.domain_blacklist, &f.domain_whitelist)
            })
            .collect()
    }

    pub fn domain_based_script_injection_filters(&self, domain: &str) -> Vec<&Arc<Filter>> {
        self.domain_js
            .iter()
            .filter(|f| {
                !f.has_domain_rules()
                    || crate::domain::domain_style_match(domain, &f.domain_blacklist, &f.domain_whitelist)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        *self = FilterContainer::default();
    }
}

fn build_global_stylesheet<'a>(filters: impl Iterator<Item = &'a Arc<Filter>>) -> String {
    let mut out = String::from("<style>");
    let mut count = 0usize;
    let mut pending = String::new();
    for f in filters {
        if f.has_domain_rules() {
            continue;
        }
        pending.push_str(&f.eval_string);
        pending.push(',');
        count += 1;
        if count >= MAX_SELECTORS_PER_RULE {
            pending.push_str("{ display: none !important; } ");
            out.push_str(&pending);
            pending.clear();
            count = 0;
        }
    }
    if count > 0 {
        pending.push_str("{ display: none !important; } ");
        out.push_str(&pending);
    }
    out.push_str("</style>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FilterParser;
    use crate::resources::ResourceStore;
    use crate::subscription::Subscription;

    fn build_from_rules(rules: &[&str]) -> FilterContainer {
        let resources = ResourceStore::new();
        let parser = FilterParser::new(&resources);
        let filters: Vec<Arc<Filter>> = rules.iter().map(|r| Arc::new(parser.parse_rule(r))).collect();
        let sub = Subscription {
            name: "test".to_string(),
            file_path: "test.txt".to_string(),
            source_url: None,
            enabled: true,
            last_update: 0,
            next_update: None,
            filters,
        };
        FilterContainer::build(&[sub])
    }

    #[test]
    fn bad_filter_removes_matching_rule() {
        let c = build_from_rules(&["adserver.com^$script", "adserver.com^$script,badfilter"]);
        let found = c.block_by_pattern.iter().chain(c.block_other.iter())
            .chain(c.block_by_domain.values().flatten())
            .any(|f| f.rule_string == "adserver.com^$script");
        assert!(!found);
    }

    #[test]
    fn domain_category_filters_are_bucketed_by_second_level_domain() {
        let mut c = build_from_rules(&["||doubleclick.net^"]);
        let found = c.find_blocking_request_filter("x.com", "https://ads.doubleclick.net/p", "doubleclick.net", ElementType::SCRIPT);
        assert!(found.is_some());
    }

    #[test]
    fn cosmetic_exception_merges_into_whitelist() {
        let c = build_from_rules(&["slashdot.org##.ad", "sub.slashdot.org#@#.ad"]);
        assert!(c.domain_style.iter().any(|f| f.domain_whitelist.contains("sub.slashdot.org")));
    }

    #[test]
    fn global_stylesheet_contains_non_domain_selectors() {
        let c = build_from_rules(&["##.generic-ad"]);
        assert!(c.global_stylesheet.contains(".generic-ad"));
    }
}

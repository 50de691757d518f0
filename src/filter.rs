//! The parsed filter record and its content-match algorithm.

use std::collections::HashSet;

use regex::Regex;

use crate::domain::domain_style_match;
use crate::hash::{contains as rk_contains, difference_hash, needle_hash};
use crate::types::{ElementType, FilterCategory};

#[derive(Debug, Clone)]
pub struct Filter {
    pub category: FilterCategory,
    pub rule_string: String,
    pub eval_string: String,
    pub content_security_policy: Option<String>,
    pub exception: bool,
    pub important: bool,
    pub disabled: bool,
    pub redirect: bool,
    pub match_case: bool,
    pub match_all: bool,
    pub redirect_name: Option<String>,
    pub allowed_types: ElementType,
    pub blocked_types: ElementType,
    pub domain_blacklist: HashSet<String>,
    pub domain_whitelist: HashSet<String>,
    pub regex: Option<Regex>,
    pub needle_hash: u64,
    pub difference_hash: u64,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category: FilterCategory::None,
            rule_string: String::new(),
            eval_string: String::new(),
            content_security_policy: None,
            exception: false,
            important: false,
            disabled: false,
            redirect: false,
            match_case: false,
            match_all: false,
            redirect_name: None,
            allowed_types: ElementType::empty(),
            blocked_types: ElementType::empty(),
            domain_blacklist: HashSet::new(),
            domain_whitelist: HashSet::new(),
            regex: None,
            needle_hash: 0,
            difference_hash: 0,
        }
    }
}

impl Filter {
    /// Populates `needle_hash`/`difference_hash` from `eval_string`.
    /// A no-op for `match_all` filters or an empty `eval_string`,
    /// matching `AdBlockFilter::hashEvalString`.
    pub fn hash_eval_string(&mut self) {
        if self.match_all || self.eval_string.is_empty() {
            return;
        }
        self.needle_hash = needle_hash(&self.eval_string);
        self.difference_hash = difference_hash(self.eval_string.len());
    }

    pub fn has_domain_rules(&self) -> bool {
        !self.domain_blacklist.is_empty() || !self.domain_whitelist.is_empty()
    }

    fn is_domain_style_applicable(&self, base_domain: &str) -> bool {
        if !self.has_domain_rules() {
            return true;
        }
        domain_style_match(base_domain, &self.domain_blacklist, &self.domain_whitelist)
    }

    /// Full content + type match algorithm (spec.md §4.4).
    pub fn is_match(
        &self,
        base_domain: &str,
        request_url: &str,
        request_domain: &str,
        type_mask: ElementType,
    ) -> bool {
        if self.disabled {
            return false;
        }
        if self.has_domain_rules() && !self.is_domain_style_applicable(base_domain) {
            return false;
        }
        if type_mask.contains(ElementType::INLINE_SCRIPT)
            && !self.blocked_types.contains(ElementType::INLINE_SCRIPT)
            && !self.allowed_types.contains(ElementType::INLINE_SCRIPT)
        {
            return false;
        }
        if self.blocked_types.contains(ElementType::THIRD_PARTY) && !type_mask.contains(ElementType::THIRD_PARTY) {
            return false;
        }
        if self.allowed_types.contains(ElementType::THIRD_PARTY) && type_mask.contains(ElementType::THIRD_PARTY) {
            return false;
        }

        let content_matches = if self.match_all {
            true
        } else {
            match self.category {
                FilterCategory::Domain => {
                    crate::domain::domain_matches(request_domain, &self.eval_string)
                }
                FilterCategory::DomainStart => {
                    let needle = &self.eval_string;
                    request_url.contains(&format!(".{needle}"))
                        || request_url.contains(&format!("/{needle}"))
                        || needle.contains(request_domain)
                }
                FilterCategory::StringStartMatch => {
                    self.compare(request_url, |h, n| h.starts_with(n))
                }
                FilterCategory::StringEndMatch => {
                    self.compare(request_url, |h, n| h.ends_with(n))
                }
                FilterCategory::StringExactMatch => {
                    self.compare(request_url, |h, n| h == n)
                }
                FilterCategory::StringContains => rk_contains(
                    &lower_unless(request_url, self.match_case),
                    &self.eval_string,
                    self.needle_hash,
                    self.difference_hash,
                ),
                FilterCategory::RegExp => self
                    .regex
                    .as_ref()
                    .map(|re| re.is_match(request_url))
                    .unwrap_or(false),
                FilterCategory::Stylesheet
                | FilterCategory::StylesheetJS
                | FilterCategory::StylesheetCustom
                | FilterCategory::Scriptlet => false,
                FilterCategory::None | FilterCategory::NotImplemented => false,
            }
        };

        if !content_matches {
            return false;
        }

        for &bit in ElementType::MATCH_ORDER {
            if type_mask.contains(bit) {
                if self.allowed_types.contains(bit) {
                    return false;
                }
                if self.blocked_types.contains(bit) {
                    return true;
                }
            }
        }

        (self.blocked_types - ElementType::NON_RESOURCE_BITS).is_empty()
    }

    fn compare(&self, haystack: &str, f: impl Fn(&str, &str) -> bool) -> bool {
        if self.match_case {
            f(haystack, &self.eval_string)
        } else {
            f(&haystack.to_ascii_lowercase(), &self.eval_string)
        }
    }
}

fn lower_unless(s: &str, match_case: bool) -> String {
    if match_case {
        s.to_string()
    } else {
        s.to_ascii_lowercase()
    }
}

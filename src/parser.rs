//! Translates one rule line of text into a [`Filter`](crate::filter::Filter).
//! See spec.md §4.1 for the full algorithm; this module follows its
//! numbered steps in order.

use regex::Regex;

use crate::cosmetic;
use crate::filter::Filter;
use crate::resources::ResourceStore;
use crate::types::{ElementType, FilterCategory};

pub struct FilterParser<'a> {
    resources: &'a ResourceStore,
}

impl<'a> FilterParser<'a> {
    pub fn new(resources: &'a ResourceStore) -> Self {
        Self { resources }
    }

    /// Joins a uBO-style multi-line rule (lines ending in `" \"`,
    /// continued by a four-space-indented next line) and returns the
    /// logical lines to parse, given an iterator of physical lines.
    pub fn join_continuations<I: Iterator<Item = String>>(lines: I) -> Vec<String> {
        let mut out = Vec::new();
        let mut pending: Option<String> = None;
        for raw in lines {
            let line = raw.trim_end_matches(['\r', '\n']).to_string();
            match pending.take() {
                Some(mut acc) => {
                    if let Some(rest) = line.strip_prefix("    ") {
                        acc.push_str(rest.trim());
                        if acc.ends_with(" \\") {
                            acc.truncate(acc.len() - 2);
                            pending = Some(acc);
                        } else {
                            out.push(acc);
                        }
                    } else {
                        out.push(acc);
                        out.push(line.clone());
                        if line.ends_with(" \\") {
                            let mut acc = line;
                            acc.truncate(acc.len() - 2);
                            pending = Some(acc);
                            out.pop();
                        }
                    }
                }
                None => {
                    if line.ends_with(" \\") {
                        let mut acc = line;
                        acc.truncate(acc.len() - 2);
                        pending = Some(acc);
                    } else {
                        out.push(line);
                    }
                }
            }
        }
        if let Some(acc) = pending {
            out.push(acc);
        }
        out
    }

    /// Parses one logical rule line. Never fails: unrecognized syntax
    /// produces a filter with `category = NotImplemented`.
    pub fn parse_rule(&self, line: &str) -> Filter {
        let trimmed = line.trim();
        let mut filter = Filter {
            rule_string: trimmed.to_string(),
            ..Default::default()
        };

        if trimmed.is_empty()
            || trimmed.starts_with('!')
            || trimmed.starts_with("[Adblock")
            || trimmed == "#"
            || trimmed.starts_with("# ")
        {
            filter.category = FilterCategory::NotImplemented;
            return filter;
        }

        if let Some(pos) = find_stylesheet_separator(trimmed) {
            self.parse_stylesheet_rule(trimmed, pos, &mut filter);
            return filter;
        }

        self.parse_url_rule(trimmed, &mut filter);
        filter
    }

    fn parse_stylesheet_rule(&self, rule: &str, pos: StylesheetSep, filter: &mut Filter) {
        let (sep_start, sep_len, exception) = match pos {
            StylesheetSep::Hide(i) => (i, 2, false),
            StylesheetSep::Procedural(i) => (i, 3, false),
            StylesheetSep::Exception(i) => (i, 3, true),
            StylesheetSep::Unsupported => {
                filter.category = FilterCategory::NotImplemented;
                return;
            }
        };
        filter.exception = exception;
        let domain_part = &rule[..sep_start];
        let eval_part = &rule[sep_start + sep_len..];
        parse_domains(domain_part, '.', ',', filter);
        filter.eval_string = eval_part.to_string();

        if is_scriptlet_call(eval_part) && filter.has_domain_rules() {
            self.parse_script_injection(eval_part, filter);
            return;
        }
        if eval_part.contains(":style(") {
            if let Some(rewritten) = cosmetic::rewrite_custom_style(eval_part) {
                filter.eval_string = rewritten;
                filter.category = FilterCategory::StylesheetCustom;
                return;
            }
        }
        if let Some(rewritten) = cosmetic::rewrite(eval_part) {
            filter.eval_string = rewritten;
            filter.category = FilterCategory::StylesheetJS;
            return;
        }
        filter.category = FilterCategory::Stylesheet;
    }

    fn parse_script_injection(&self, eval_part: &str, filter: &mut Filter) {
        let inner = eval_part
            .trim_start_matches("script:inject(")
            .trim_start_matches("+js(")
            .trim_end_matches(')');
        let mut parts = inner.split(',').map(str::trim).filter(|s| !s.is_empty());
        let name = match parts.next() {
            Some(n) => n,
            None => {
                filter.category = FilterCategory::NotImplemented;
                return;
            }
        };
        let args: Vec<&str> = parts.collect();
        let body = self.resources.get(name);
        filter.category = FilterCategory::Scriptlet;
        if body.is_empty() {
            filter.eval_string = String::new();
            return;
        }
        filter.eval_string = cosmetic::render_scriptlet(body, &args);
    }

    fn parse_url_rule(&self, rule: &str, filter: &mut Filter) {
        let mut s = rule;
        if let Some(rest) = s.strip_prefix("@@") {
            filter.exception = true;
            s = rest;
        }

        let mut body = s.to_string();
        if let Some(dollar) = find_option_separator(&body) {
            let options = body[dollar + 1..].to_string();
            body.truncate(dollar);
            parse_options(&options, filter);
            if filter.category == FilterCategory::NotImplemented {
                return;
            }
        }

        if filter.exception && filter.blocked_types.contains(ElementType::DOCUMENT) {
            filter.disabled = true;
        }

        if body.is_empty() || body == "*" {
            filter.match_all = true;
        }

        if body.starts_with('/') && body.len() > 1 && body.ends_with('/') {
            let pattern = &body[1..body.len() - 1];
            compile_regex(pattern, filter);
            return;
        }

        while body.starts_with('*') {
            body.remove(0);
        }
        while body.ends_with('*') {
            body.pop();
        }

        if body.starts_with("||") && body.ends_with('^') && is_domain_rule(&body) {
            filter.category = FilterCategory::Domain;
            filter.eval_string = lowercase_unless(&body[2..body.len() - 1], filter.match_case);
            filter.hash_eval_string();
            return;
        }

        let maybe_regexp = body.contains('*') || body.contains('^');

        if body.starts_with("||") && !maybe_regexp {
            filter.category = FilterCategory::DomainStart;
            filter.eval_string = lowercase_unless(&body[2..], filter.match_case);
            filter.hash_eval_string();
            return;
        }

        if body.starts_with('|') && !body.starts_with("||") && !maybe_regexp {
            let rest = &body[1..];
            if rest.ends_with('|') {
                filter.category = FilterCategory::StringExactMatch;
                filter.eval_string = lowercase_unless(&rest[..rest.len() - 1], filter.match_case);
            } else {
                filter.category = FilterCategory::StringStartMatch;
                filter.eval_string = lowercase_unless(rest, filter.match_case);
            }
            filter.hash_eval_string();
            return;
        }

        if body.ends_with('|') && !maybe_regexp {
            filter.category = FilterCategory::StringEndMatch;
            filter.eval_string = lowercase_unless(&body[..body.len() - 1], filter.match_case);
            filter.hash_eval_string();
            return;
        }

        if maybe_regexp || body.contains('|') {
            compile_regex(&to_regex_source(&body), filter);
            return;
        }

        filter.category = FilterCategory::StringContains;
        filter.eval_string = lowercase_unless(&body, filter.match_case);
        parse_for_csp(filter);
        filter.hash_eval_string();
    }
}

fn lowercase_unless(s: &str, match_case: bool) -> String {
    if match_case {
        s.to_string()
    } else {
        s.to_ascii_lowercase()
    }
}

fn compile_regex(pattern: &str, filter: &mut Filter) {
    let built = if filter.match_case {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?i){pattern}"))
    };
    match built {
        Ok(re) => {
            filter.regex = Some(re);
            filter.category = FilterCategory::RegExp;
        }
        Err(_) => {
            filter.category = FilterCategory::NotImplemented;
        }
    }
}

/// Converts the residual rule syntax (`*`, `^`, leading/trailing `|`)
/// into a regular-expression source string, per spec.md §4.1 step 10.
fn to_regex_source(body: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = body.chars().collect();
    let mut used_star = false;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => {
                if !used_star {
                    out.push_str("[^ ]*?");
                    used_star = true;
                }
            }
            '^' => out.push_str("(?:[^%.a-zA-Z0-9_-]|$)"),
            '|' if i == 0 && chars.get(1) == Some(&'|') => {
                out.push_str("^[a-z-]+://(?:[^\\/?#]+\\.)?");
                i += 1;
            }
            '|' if i == 0 => out.push('^'),
            '|' if i == chars.len() - 1 => out.push('$'),
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
        i += 1;
    }
    out
}

enum StylesheetSep {
    Hide(usize),
    Procedural(usize),
    Exception(usize),
    Unsupported,
}

fn find_stylesheet_separator(rule: &str) -> Option<StylesheetSep> {
    const UNSUPPORTED: &[&str] = &["##^", "#%#", "#@%#", "#$#", "#@$#"];
    let candidates: [(&str, fn(usize) -> StylesheetSep); 3] = [
        ("#@#", StylesheetSep::Exception),
        ("#?#", StylesheetSep::Procedural),
        ("##", StylesheetSep::Hide),
    ];

    let mut earliest: Option<(usize, StylesheetSep)> = None;
    for marker in UNSUPPORTED {
        if let Some(idx) = rule.find(marker) {
            if earliest.as_ref().map(|(ei, _)| idx < *ei).unwrap_or(true) {
                earliest = Some((idx, StylesheetSep::Unsupported));
            }
        }
    }
    for (marker, ctor) in candidates {
        if let Some(idx) = rule.find(marker) {
            if earliest.as_ref().map(|(ei, _)| idx < *ei).unwrap_or(true) {
                earliest = Some((idx, ctor(idx)));
            }
        }
    }
    earliest.map(|(_, sep)| sep)
}

fn is_scriptlet_call(eval_part: &str) -> bool {
    eval_part.starts_with("+js(") || eval_part.starts_with("script:inject(")
}

fn is_domain_rule(body: &str) -> bool {
    if body.len() < 3 {
        return false;
    }
    let interior = &body[2..body.len() - 1];
    !interior.contains(['/', ':', '?', '=', '&', '*'])
}

fn find_option_separator(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'$' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_alphabetic() {
            return Some(i);
        }
    }
    None
}

/// Populates domain blacklist/whitelist from a `,`- or `|`-delimited
/// domain-list string. `~` prefix means "whitelist"; a trailing `.`
/// (from a normalized `.*` entity suffix) is preserved as an entity
/// pattern.
fn parse_domains(domain_string: &str, _entity_suffix: char, delimiter: char, filter: &mut Filter) {
    for raw in domain_string.split(delimiter) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (negated, rest) = match raw.strip_prefix('~') {
            Some(r) => (true, r),
            None => (false, raw),
        };
        let normalized = if let Some(base) = rest.strip_suffix(".*") {
            format!("{base}.")
        } else {
            rest.to_string()
        };
        if negated {
            filter.domain_whitelist.insert(normalized);
        } else {
            filter.domain_blacklist.insert(normalized);
        }
    }
}

/// Applies `$option,option,...` to a filter in progress.
fn parse_options(option_string: &str, filter: &mut Filter) {
    for raw in option_string.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (negated, name_and_value) = match raw.strip_prefix('~') {
            Some(r) => (true, r),
            None => (false, raw),
        };

        if let Some(value) = name_and_value.strip_prefix("domain=") {
            parse_domains(value, '.', '|', filter);
            continue;
        }
        if let Some(value) = name_and_value.strip_prefix("csp=") {
            filter.blocked_types |= ElementType::CSP;
            filter.content_security_policy = Some(value.to_string());
            continue;
        }
        if let Some(value) = name_and_value
            .strip_prefix("redirect=")
            .or_else(|| name_and_value.strip_prefix("redirect-rule="))
        {
            filter.redirect = true;
            filter.redirect_name = Some(value.to_string());
            continue;
        }
        if name_and_value == "empty" {
            filter.redirect = true;
            filter.redirect_name = Some("nooptext".to_string());
            continue;
        }
        if name_and_value == "mp4" {
            filter.redirect = true;
            filter.redirect_name = Some("noopmp4-1s".to_string());
            continue;
        }
        if name_and_value == "first-party" || name_and_value == "1p" {
            filter.allowed_types |= ElementType::THIRD_PARTY;
            continue;
        }
        if name_and_value == "all" {
            filter.blocked_types |= ElementType::SCRIPT
                | ElementType::IMAGE
                | ElementType::STYLESHEET
                | ElementType::OBJECT
                | ElementType::XML_HTTP_REQUEST
                | ElementType::OBJECT_SUBREQUEST
                | ElementType::SUBDOCUMENT
                | ElementType::PING
                | ElementType::WEBSOCKET
                | ElementType::DOCUMENT
                | ElementType::OTHER;
            continue;
        }
        if name_and_value == "important" {
            if !filter.exception {
                filter.important = true;
            }
            continue;
        }

        match ElementType::from_option_name(name_and_value) {
            Some(ElementType::MATCH_CASE) => filter.match_case = true,
            Some(bit) => {
                if negated {
                    filter.allowed_types |= bit;
                } else {
                    filter.blocked_types |= bit;
                }
            }
            None => {}
        }
    }

    if filter.blocked_types.contains(ElementType::BAD_FILTER) {
        if let Some(stripped) = filter
            .rule_string
            .strip_suffix(",badfilter")
            .or_else(|| filter.rule_string.strip_suffix("$badfilter"))
        {
            filter.rule_string = stripped.to_string();
        }
    }

    if filter.allowed_types.contains(ElementType::NOT_IMPLEMENTED)
        || filter.blocked_types.contains(ElementType::NOT_IMPLEMENTED)
    {
        filter.category = FilterCategory::NotImplemented;
    }
}

/// Recognizes `blob:`/`data:` eval strings and converts the filter
/// in-place into a CSP-injecting `Domain` filter (spec.md §4.1 step 12).
fn parse_for_csp(filter: &mut Filter) {
    let starts_blob = filter.eval_string.starts_with("blob:");
    let starts_data = filter.eval_string.starts_with("data:");
    if !starts_blob && !starts_data {
        return;
    }
    let token = if starts_blob { "blob:" } else { "data:" };
    filter.category = FilterCategory::Domain;
    filter.blocked_types |= ElementType::CSP;
    filter.eval_string.clear();

    let mut directives = Vec::new();
    if filter.blocked_types.contains(ElementType::SUBDOCUMENT) {
        directives.push(format!("frame-src 'self' * {token}"));
    }
    if filter.blocked_types.contains(ElementType::SCRIPT) {
        directives.push(format!("script-src 'self' * {token}"));
    }
    if directives.is_empty() {
        directives.push(format!("default-src 'self' * {token}"));
    }
    filter.content_security_policy = Some(directives.join("; "));
}

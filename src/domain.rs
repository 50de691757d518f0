//! Domain-string helpers: registrable-domain extraction, the filter
//! domain-match predicate, and third-party detection.

/// Extracts the host portion of a URL, lowercased, with a leading
/// `www.` stripped. Falls back to the empty string for opaque or
/// unparseable inputs (callers treat an empty host as third-party,
/// matching spec.md §4.6/§7).
pub fn host_of(url: &str) -> String {
    let without_scheme = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let host_end = without_scheme
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(without_scheme.len());
    let mut host = without_scheme[..host_end].to_ascii_lowercase();
    if let Some(at) = host.rfind('@') {
        host = host[at + 1..].to_string();
    }
    if let Some(colon) = host.rfind(':') {
        if host[colon + 1..].chars().all(|c| c.is_ascii_digit()) {
            host.truncate(colon);
        }
    }
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Registrable ("second-level") domain: the last two dot-separated
/// labels of a host. This is a pragmatic heuristic, not a full public-
/// suffix-list lookup (no PSL data is part of this crate); it is
/// correct for the overwhelming majority of two-label and three-label
/// hosts under generic TLDs, which is what the filter lists this
/// engine consumes are written against. See DESIGN.md for why a full
/// PSL was not adopted.
pub fn second_level_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').filter(|s| !s.is_empty()).collect();
    match labels.len() {
        0 => String::new(),
        1 => labels[0].to_string(),
        n => format!("{}.{}", labels[n - 2], labels[n - 1]),
    }
}

/// Domain-match predicate used both for filter `domain=` constraints
/// and for `Domain`-category content matching (spec.md §4.6):
///
/// 1. `pattern` ending in `.` is an entity filter: matches if `domain`'s
///    last label before the final dot equals the pattern's prefix.
/// 2. Exact equality.
/// 3. `pattern` is a suffix of `domain` on a label boundary (the
///    character preceding the match in `domain` is `.`).
pub fn domain_matches(domain: &str, pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('.') {
        let base = domain.rsplit_once('.').map(|(b, _)| b).unwrap_or(domain);
        return base == prefix;
    }
    if domain == pattern {
        return true;
    }
    if let Some(idx) = domain.len().checked_sub(pattern.len()) {
        if domain.ends_with(pattern) && idx > 0 && domain.as_bytes()[idx - 1] == b'.' {
            return true;
        }
    }
    false
}

/// Applies the whitelist/blacklist domain-style-match rule from
/// spec.md §4.1/§4.4: a whitelist hit always wins (not applicable); an
/// empty blacklist with a non-empty whitelist is applicable everywhere
/// else; otherwise a blacklist hit is required.
pub fn domain_style_match(
    domain: &str,
    blacklist: &std::collections::HashSet<String>,
    whitelist: &std::collections::HashSet<String>,
) -> bool {
    if whitelist.iter().any(|p| domain_matches(domain, p)) {
        return false;
    }
    if blacklist.is_empty() {
        return !whitelist.is_empty();
    }
    blacklist.iter().any(|p| domain_matches(domain, p))
}

/// True if `first_party_host` and `request_host` have different
/// registrable domains, or either is empty/opaque.
pub fn is_third_party(first_party_host: &str, request_host: &str) -> bool {
    if first_party_host.is_empty() || first_party_host == "." {
        return true;
    }
    second_level_domain(first_party_host) != second_level_domain(request_host)
}

//! End-to-end scenario tests, one per example in spec.md's testable
//! properties section.

use filtercore::{Decision, ElementType, Engine, Settings};
use std::io::Write;

fn engine_from_rules(rules: &[&str]) -> Engine {
    let mut path = std::env::temp_dir();
    path.push(format!("filtercore-scenario-{}.txt", rules.join("").len()));
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "{}", rules.join("\n")).unwrap();
    let mut engine = Engine::new(Settings::default());
    engine.load_subscription(&path, 0).unwrap();
    std::fs::remove_file(&path).ok();
    engine
}

#[test]
fn should_inject_cosmetic_selector_for_matching_domain() {
    // Given: a domain-scoped cosmetic hide rule
    let engine = engine_from_rules(&["slashdot.org##.ntv-sponsored"]);

    // When: assembling the stylesheet for a subdomain of that domain
    let css = engine.domain_stylesheet("https://developers.slashdot.org/story/x");

    // Then: the selector is present, wrapped in a hiding rule
    assert!(css.contains(".ntv-sponsored"));
    assert!(css.contains("display: none !important"));
}

#[test]
fn should_block_request_gated_by_element_type_and_domain() {
    // Given: a block rule scoped to images from a third-party domain
    let engine = engine_from_rules(&[
        "|https://$image,media,script,third-party,domain=watchvid.com",
    ]);

    // When: an image request from a different CDN is loaded on that page
    let decision = engine.should_block(
        "https://www.watchvid.com/watch?id=123456",
        "https://subdomain.mycdn.com/videos/thumbnails/5.jpg",
        ElementType::IMAGE,
        0,
    );

    // Then: the request is blocked
    assert_eq!(decision, Decision::Block);
}

#[test]
fn should_allow_when_exception_filter_overrides_block() {
    // Given: the same block rule plus a matching exception
    let engine = engine_from_rules(&[
        "|https://$image,media,script,third-party,domain=watchvid.com",
        "@@||mycdn.com^$image,media,object,stylesheet,domain=watchvid.com",
    ]);

    // When: the same request is checked again
    let decision = engine.should_block(
        "https://www.watchvid.com/watch?id=123456",
        "https://subdomain.mycdn.com/videos/thumbnails/5.jpg",
        ElementType::IMAGE,
        0,
    );

    // Then: the exception wins
    assert_eq!(decision, Decision::Allow);
}

#[test]
fn should_redirect_known_analytics_script() {
    // Given: a redirect rule naming a noop resource
    let engine = engine_from_rules(&[
        "||google-analytics.com/ga.js$script,redirect=google-analytics.com/ga.js",
    ]);

    // When: a matching script request is made
    let decision = engine.should_block(
        "https://example.com/",
        "https://ssl.google-analytics.com/ga.js",
        ElementType::SCRIPT,
        0,
    );

    // Then: a redirect naming the resource is returned, not a bare block
    assert_eq!(
        decision,
        Decision::Redirect("google-analytics.com/ga.js".to_string())
    );
}

#[test]
fn should_remove_filter_named_by_a_badfilter_rule() {
    // Given: a block rule and its badfilter counterpart
    let engine = engine_from_rules(&[
        "adserver.com^$script",
        "adserver.com^$script,badfilter",
    ]);

    // When: a request matching the removed rule's pattern is checked
    let decision = engine.should_block(
        "https://example.com/",
        "https://adserver.com/tag.js",
        ElementType::SCRIPT,
        0,
    );

    // Then: it is no longer blocked
    assert_eq!(decision, Decision::Allow);
}

#[test]
fn should_convert_wildcard_domain_rule_to_regex_and_match() {
    // Given: a rule with an embedded wildcard in the domain portion
    let engine = engine_from_rules(&["||ads.*.example.com^"]);

    // When: a concrete subdomain matching the wildcard is requested
    let decision = engine.should_block(
        "https://example.com/",
        "https://ads.foo.example.com/",
        ElementType::SCRIPT,
        0,
    );

    // Then: it is blocked
    assert_eq!(decision, Decision::Block);
}

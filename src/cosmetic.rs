//! Rewrites procedural cosmetic pseudo-classes (`:has`, `:has-text`,
//! `:if`, `:xpath`, ...) into a canonical JavaScript call string that a
//! content script can evaluate, and substitutes scriptlet arguments
//! into named resource bodies.

use crate::types::CosmeticDirective;

const CHAINABLE: &[(&str, CosmeticDirective)] = &[
    (":has-text(", CosmeticDirective::HasText),
    (":-abp-contains(", CosmeticDirective::HasText),
    (":if-not(", CosmeticDirective::IfNot),
    (":if(", CosmeticDirective::If),
    (":-abp-has(", CosmeticDirective::If),
    (":has(", CosmeticDirective::Has),
    (":not(", CosmeticDirective::Not),
    (":matches-css-before(", CosmeticDirective::MatchesCssBefore),
    (":matches-css-after(", CosmeticDirective::MatchesCssAfter),
    (":matches-css(", CosmeticDirective::MatchesCss),
    (":xpath(", CosmeticDirective::XPath),
    (":nth-ancestor(", CosmeticDirective::NthAncestor),
    (":min-text-length(", CosmeticDirective::MinTextLength),
    (":upward(", CosmeticDirective::Upward),
    (":remove(", CosmeticDirective::Remove),
];

/// Finds the first chainable directive in `text`, applying ABP/AdGuard
/// alias normalization first (`:-abp-contains` -> `:has-text`,
/// `:-abp-has` -> `:if`, `[-ext-has=...]` -> `:if(...)`,
/// `:not(:has(` -> `:if-not(`). Returns the normalized text plus the
/// (position, directive, selector, argument) of the first directive
/// found, or `None` if the text contains no supported directive.
pub fn rewrite(raw: &str) -> Option<String> {
    let normalized = normalize_aliases(raw);
    if normalized.contains(":-abp-") {
        // residual unsupported ABP extension (e.g. :-abp-properties)
        return None;
    }
    let (pos, kind, _marker) = find_first_directive(&normalized)?;
    let selector = normalized[..pos].to_string();
    let (arg, _end) = extract_argument(&normalized, pos)?;
    Some(emit(kind, &selector, &arg))
}

fn normalize_aliases(raw: &str) -> String {
    let mut s = raw.replace(":-abp-contains(", ":has-text(");
    s = s.replace(":-abp-has(", ":if(");
    s = s.replace(":not(:has(", ":if-not(:has(");
    if let Some(start) = s.find("[-ext-has=") {
        if let Some(close) = s[start..].find(']') {
            let quoted = &s[start + "[-ext-has=".len()..start + close];
            let inner = quoted.trim_matches(|c| c == '"' || c == '\'');
            let replacement = format!(":if({inner})");
            s.replace_range(start..start + close + 1, &replacement);
        }
    }
    s
}

fn find_first_directive(text: &str) -> Option<(usize, CosmeticDirective, &'static str)> {
    CHAINABLE
        .iter()
        .filter_map(|(marker, kind)| text.find(marker).map(|idx| (idx, *kind, *marker)))
        .min_by_key(|(idx, _, _)| *idx)
}

/// Extracts the balanced-parenthesis argument following a directive
/// marker at `start` (pointing at the `:`). Returns the trimmed
/// argument text and the index just past the closing paren.
fn extract_argument(text: &str, start: usize) -> Option<(String, usize)> {
    let open = text[start..].find('(')? + start;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((text[open + 1..i].to_string(), i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_regex_literal(arg: &str) -> bool {
    let a = arg.trim();
    a.starts_with('/') && a.len() > 1 && (a.ends_with('/') || a.rfind('/') == Some(a.len() - 3))
}

fn quote(arg: &str) -> String {
    if is_regex_literal(arg) {
        arg.trim().to_string()
    } else {
        format!("'{}'", arg.trim().replace('\'', "\\'"))
    }
}

fn emit(kind: CosmeticDirective, selector: &str, arg: &str) -> String {
    let sel = if kind == CosmeticDirective::XPath && selector.is_empty() {
        "'document'".to_string()
    } else {
        quote(selector)
    };
    match kind {
        CosmeticDirective::Has => format!("hideIfHas({sel}, {}); ", quote(arg)),
        CosmeticDirective::HasText => format!("hideNodes(hasText, {sel}, {}); ", quote(arg)),
        CosmeticDirective::If => {
            if let Some(nested) = find_first_directive(arg) {
                let (callback, target) = nested_translation(arg, nested);
                format!("hideIfChain({sel}, {callback}, {target}); ")
            } else {
                format!("hideIfHas({sel}, {}); ", quote(arg))
            }
        }
        CosmeticDirective::IfNot | CosmeticDirective::Not => {
            if let Some(nested) = find_first_directive(arg) {
                let (callback, target) = nested_translation(arg, nested);
                format!("hideIfNotChain({sel}, {callback}, {target}); ")
            } else {
                format!("hideIfNotHas({sel}, {}); ", quote(arg))
            }
        }
        CosmeticDirective::MatchesCss => format!("hideNodes(matchesCSS, {sel}, {}); ", quote(arg)),
        CosmeticDirective::MatchesCssBefore => {
            format!("hideNodes(matchesCSSBefore, {sel}, {}); ", quote(arg))
        }
        CosmeticDirective::MatchesCssAfter => {
            format!("hideNodes(matchesCSSAfter, {sel}, {}); ", quote(arg))
        }
        CosmeticDirective::XPath => format!("hideNodes(doXPath, {sel}, {}); ", quote(arg)),
        CosmeticDirective::NthAncestor => format!("hideNodes(nthAncestor, {sel}, {}); ", arg.trim()),
        CosmeticDirective::MinTextLength => {
            format!("hideNodes(minTextLength, {sel}, {}); ", arg.trim())
        }
        CosmeticDirective::Upward => format!("hideNodes(upwardMatch, {sel}, {}); ", quote(arg)),
        CosmeticDirective::Remove => format!("hideNodes(removeNodes, {sel}, ''); "),
    }
}

fn nested_translation(
    arg: &str,
    (pos, kind, marker): (usize, CosmeticDirective, &'static str),
) -> (String, String) {
    let callback = callback_name(kind);
    let inner_start = pos + marker.len() - 1;
    let (inner_arg, _) = extract_argument(arg, inner_start).unwrap_or((String::new(), 0));
    (format!("'{callback}'"), quote(&inner_arg))
}

fn callback_name(kind: CosmeticDirective) -> &'static str {
    match kind {
        CosmeticDirective::Has | CosmeticDirective::If => "hasOwn",
        CosmeticDirective::HasText => "hasText",
        CosmeticDirective::IfNot | CosmeticDirective::Not => "notHas",
        CosmeticDirective::MatchesCss => "matchesCSS",
        CosmeticDirective::MatchesCssBefore => "matchesCSSBefore",
        CosmeticDirective::MatchesCssAfter => "matchesCSSAfter",
        CosmeticDirective::XPath => "doXPath",
        CosmeticDirective::NthAncestor => "nthAncestor",
        CosmeticDirective::MinTextLength => "minTextLength",
        CosmeticDirective::Upward => "upwardMatch",
        CosmeticDirective::Remove => "removeNodes",
    }
}

/// `:style(arg)` custom-stylesheet rewrite: `selector { arg }`.
pub fn rewrite_custom_style(raw: &str) -> Option<String> {
    let start = raw.find(":style(")?;
    let selector = &raw[..start];
    let (arg, _) = extract_argument(raw, start)?;
    Some(format!("{selector} {{ {} }} ", arg.trim()))
}

/// Substitutes `{{i}}` (1-indexed) placeholders in a scriptlet body
/// with quoted arguments, then wraps the result in a non-throwing
/// try/catch template so a malformed scriptlet cannot break the page.
pub fn render_scriptlet(body: &str, args: &[&str]) -> String {
    let mut rendered = body.to_string();
    for (i, arg) in args.iter().enumerate() {
        let placeholder = format!("{{{{{}}}}}", i + 1);
        let escaped = arg.trim().replace('\'', "\\'");
        if let Some(pos) = rendered.find(&placeholder) {
            rendered.replace_range(pos..pos + placeholder.len(), &escaped);
        }
    }
    format!(
        "try {{ \n{rendered}\n}} catch (ex) {{ \nconsole.error('[filtercore] scriptlet error: ', ex);\nconsole.error(ex.stack);\n}} \n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_rewrites_to_hide_if_has() {
        let out = rewrite(".ad:has(.inner)").unwrap();
        assert_eq!(out, "hideIfHas('.ad', '.inner'); ");
    }

    #[test]
    fn has_text_rewrites_with_literal_argument() {
        let out = rewrite(".post:has-text(Sponsored)").unwrap();
        assert_eq!(out, "hideNodes(hasText, '.post', 'Sponsored'); ");
    }

    #[test]
    fn regex_literal_argument_passes_through_unescaped() {
        let out = rewrite(".post:has-text(/^Ad$/)").unwrap();
        assert_eq!(out, "hideNodes(hasText, '.post', /^Ad$/); ");
    }

    #[test]
    fn abp_alias_is_normalized() {
        let out = rewrite(".post:-abp-contains(Sponsored)").unwrap();
        assert_eq!(out, "hideNodes(hasText, '.post', 'Sponsored'); ");
    }

    #[test]
    fn remove_directive_ignores_its_empty_argument() {
        let out = rewrite(".ad:remove()").unwrap();
        assert_eq!(out, "hideNodes(removeNodes, '.ad', ''); ");
    }

    #[test]
    fn min_text_length_argument_is_unquoted_numeric() {
        let out = rewrite(".p:min-text-length(40)").unwrap();
        assert_eq!(out, "hideNodes(minTextLength, '.p', 40); ");
    }

    #[test]
    fn xpath_with_no_selector_targets_document() {
        let out = rewrite(":xpath(//div[@id=\"ad\"])").unwrap();
        assert_eq!(out, "hideNodes(doXPath, 'document', '//div[@id=\"ad\"]'); ");
    }

    #[test]
    fn custom_style_rewrite() {
        let out = rewrite_custom_style(".ad:style(display: none;)").unwrap();
        assert_eq!(out, ".ad { display: none; } ");
    }

    #[test]
    fn scriptlet_substitutes_placeholders_and_wraps_try_catch() {
        let out = render_scriptlet("console.log('{{1}}', {{2}});", &["hello", "42"]);
        assert!(out.starts_with("try { \n"));
        assert!(out.contains("console.log('hello', 42);"));
        assert!(out.contains("catch (ex)"));
    }

    #[test]
    fn plain_selector_with_no_directive_is_not_rewritten() {
        assert!(rewrite(".banner-ad").is_none());
    }

    #[test]
    fn unsupported_abp_properties_is_not_rewritten() {
        assert!(rewrite(".x:-abp-properties(display: none)").is_none());
    }
}

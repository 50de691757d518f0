//! Element-type bitfield, filter categories, and the few small enums
//! shared across the parser, container, and request handler.

use bitflags::bitflags;

bitflags! {
    /// Resource-type / option bitfield attached to a filter. Bits are
    /// combined with bitwise OR exactly as the rule syntax combines
    /// comma-separated options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementType: u64 {
        const SCRIPT            = 0x0000_0001;
        const IMAGE              = 0x0000_0002;
        const STYLESHEET         = 0x0000_0004;
        const OBJECT             = 0x0000_0008;
        const XML_HTTP_REQUEST   = 0x0000_0010;
        const OBJECT_SUBREQUEST  = 0x0000_0020;
        const SUBDOCUMENT        = 0x0000_0040;
        const PING               = 0x0000_0080;
        const WEBSOCKET          = 0x0000_0100;
        const WEBRTC             = 0x0000_0200;
        const DOCUMENT           = 0x0000_0400;
        const ELEM_HIDE          = 0x0000_0800;
        const GENERIC_HIDE       = 0x0000_1000;
        const GENERIC_BLOCK      = 0x0000_2000;
        const POPUP              = 0x0000_4000;
        const THIRD_PARTY        = 0x0000_8000;
        const MATCH_CASE         = 0x0001_0000;
        const COLLAPSE           = 0x0002_0000;
        const BAD_FILTER         = 0x0004_0000;
        const CSP                = 0x0008_0000;
        const INLINE_SCRIPT      = 0x0010_0000;
        const OTHER              = 0x0040_0000;
        const NOT_IMPLEMENTED    = 0x0080_0000;
    }
}

impl ElementType {
    /// Bits checked, in this fixed order, by [`crate::filter::Filter::is_match`]
    /// once a content match has been established. Order matters: the
    /// first bit present in the request's type mask that the filter
    /// has an opinion on (allowed or blocked) decides the outcome.
    pub const MATCH_ORDER: &'static [ElementType] = &[
        ElementType::XML_HTTP_REQUEST,
        ElementType::DOCUMENT,
        ElementType::OBJECT,
        ElementType::SUBDOCUMENT,
        ElementType::IMAGE,
        ElementType::SCRIPT,
        ElementType::STYLESHEET,
        ElementType::WEBSOCKET,
        ElementType::OBJECT_SUBREQUEST,
        ElementType::INLINE_SCRIPT,
        ElementType::PING,
        ElementType::CSP,
        ElementType::OTHER,
    ];

    /// Bits that do not name a resource type and so must be ignored
    /// when deciding whether a filter's `blocked_types` restricts it
    /// away from the current request's type mask.
    pub const NON_RESOURCE_BITS: ElementType = ElementType::THIRD_PARTY
        .union(ElementType::MATCH_CASE)
        .union(ElementType::COLLAPSE);

    /// Looks up the bit named by a rule option string (case-insensitive).
    /// Returns `None` for option names that are not element-type options
    /// at all (e.g. `domain=`, `csp=`), and `Some(NOT_IMPLEMENTED)` for
    /// recognized-but-unsupported options.
    pub fn from_option_name(name: &str) -> Option<ElementType> {
        Some(match name {
            "script" => ElementType::SCRIPT,
            "image" => ElementType::IMAGE,
            "stylesheet" | "css" => ElementType::STYLESHEET,
            "object" => ElementType::OBJECT,
            "xmlhttprequest" | "xhr" => ElementType::XML_HTTP_REQUEST,
            "object-subrequest" => ElementType::OBJECT_SUBREQUEST,
            "subdocument" | "frame" => ElementType::SUBDOCUMENT,
            "ping" => ElementType::PING,
            "websocket" => ElementType::WEBSOCKET,
            "webrtc" => ElementType::WEBRTC,
            "document" | "doc" => ElementType::DOCUMENT,
            "elemhide" => ElementType::ELEM_HIDE,
            "generichide" => ElementType::GENERIC_HIDE,
            "genericblock" => ElementType::GENERIC_BLOCK,
            "popup" => ElementType::POPUP,
            "third-party" | "3p" => ElementType::THIRD_PARTY,
            "match-case" => ElementType::MATCH_CASE,
            "collapse" => ElementType::COLLAPSE,
            "badfilter" => ElementType::BAD_FILTER,
            "inline-script" => ElementType::INLINE_SCRIPT,
            "other" => ElementType::OTHER,
            "cname" | "popunder" | "denyallow" => ElementType::NOT_IMPLEMENTED,
            _ => return None,
        })
    }
}

/// Mutually exclusive classification of a parsed filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    None,
    Stylesheet,
    StylesheetJS,
    StylesheetCustom,
    Domain,
    DomainStart,
    StringStartMatch,
    StringEndMatch,
    StringExactMatch,
    StringContains,
    RegExp,
    Scriptlet,
    NotImplemented,
}

impl Default for FilterCategory {
    fn default() -> Self {
        FilterCategory::None
    }
}

/// Procedural cosmetic pseudo-class kinds recognized by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmeticDirective {
    Has,
    HasText,
    If,
    IfNot,
    Not,
    MatchesCss,
    MatchesCssBefore,
    MatchesCssAfter,
    XPath,
    NthAncestor,
    MinTextLength,
    Upward,
    Remove,
}

/// Outcome of a request-handler decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block,
    Redirect(String),
}

impl Decision {
    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block | Decision::Redirect(_))
    }
}

/// Action recorded in a [`crate::log::LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Allow,
    Block,
    Redirect,
}

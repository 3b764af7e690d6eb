/// Regex patterns for preprocessor directives
///
/// All patterns are compiled once at first use through `LazyLock`.
///
/// Basic patterns are case-insensitive; C-family patterns are exact.
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. This is acceptable because all patterns
/// in this module are compile-time constants that are verified by tests.
/// The panic occurs at first access of the `LazyLock` static.
fn build_re(pattern: &str, case_insensitive: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .unicode(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

// ===== C-FAMILY =====

/// `#` keyword argument, e.g. `#  ifdef  DEBUG`
pub static C_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*([A-Za-z_]\w*)?[ \t]*(.*?)[ \t]*$", false));

/// Identifier at the start of a `#define` argument
pub static C_DEFINE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^([A-Za-z_]\w*)", false));

// ===== BASIC =====

/// `#If cond Then` and `#ElseIf cond Then`
pub static BASIC_IF_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^#[ \t]*(If|ElseIf)[ \t]+(.*?)(?:[ \t]+Then)?[ \t]*$", true)
});

pub static BASIC_ELSE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*Else[ \t]*(?:'.*)?$", true));

pub static BASIC_END_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*End[ \t]*(If|Region)\b", true));

/// `#Const NAME = value`
pub static BASIC_CONST_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*Const[ \t]+(\w+)[ \t]*=[ \t]*(.*?)[ \t]*$", true));

pub static BASIC_REGION_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*Region\b[ \t]*(.*?)[ \t]*$", true));

/// Any other `#keyword` line (`#ExternalSource`, `#Disable`, ...)
pub static BASIC_OTHER_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#[ \t]*[A-Za-z]\w*", true));

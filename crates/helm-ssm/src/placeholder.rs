//! placeholder grammar
//!
//! | **token**                       | **kind**                    |
//! |---------------------------------|-----------------------------|
//! | `{{ssm <key>}}`                 | [Kind::Single]              |
//! | `{{ssm-path <prefix>}}`         | [Kind::PathTree]            |
//! | `{{ssm-path-prefix <prefix>}}`  | [Kind::PathPrefixList]      |
//!
//! A [Kind::PathPrefixList] token opens a block of `- <suffix>` list items which is
//! closed by an `{{end}}` line.
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static PATH_PREFIX_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*ssm-path-prefix\s+([^\s}]+)\s*\}\}").expect("valid regex")
});
static PATH_TREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*ssm-path\s+([^\s}]+)\s*\}\}").expect("valid regex"));
static SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*ssm\s+([^\s}]+)\s*\}\}").expect("valid regex"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s+(\S+)\s*$").expect("valid regex"));
static END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\{\{\s*end\s*\}\}\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// One parameter, substituted as its plain value
    Single,
    /// All parameters below a path, substituted as an object
    PathTree,
    /// All parameters below several paths, substituted as an array of objects
    PathPrefixList,
}

impl Kind {
    /// Match order. More specific keywords first, `ssm-path-prefix` must not be read as `ssm-path`.
    pub const PRIORITY: [Kind; 3] = [Kind::PathPrefixList, Kind::PathTree, Kind::Single];

    fn regex(self) -> &'static Regex {
        match self {
            Kind::Single => &SINGLE,
            Kind::PathTree => &PATH_TREE,
            Kind::PathPrefixList => &PATH_PREFIX_LIST,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Single => f.write_str("ssm"),
            Kind::PathTree => f.write_str("ssm-path"),
            Kind::PathPrefixList => f.write_str("ssm-path-prefix"),
        }
    }
}

/// A placeholder token found in a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub kind: Kind,
    /// byte range of the whole token
    pub token: Range<usize>,
    /// byte range of the key, path or prefix inside the token
    pub argument: Option<Range<usize>>,
}

impl Match {
    /// The captured key, path or prefix
    pub fn argument<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.argument.clone().map(|range| &line[range])
    }
}

/// Finds the first placeholder in `line`, trying the kinds in [Kind::PRIORITY] order
pub fn find(line: &str) -> Option<Match> {
    Kind::PRIORITY.into_iter().find_map(|kind| {
        let captures = kind.regex().captures(line)?;
        let token = captures.get(0)?.range();
        let argument = captures.get(1).map(|group| group.range());
        Some(Match {
            kind,
            token,
            argument,
        })
    })
}

/// Suffix of a `- <suffix>` list item line
pub fn list_item(line: &str) -> Option<&str> {
    LIST_ITEM
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str())
}

pub fn is_end_marker(line: &str) -> bool {
    END_MARKER.is_match(line)
}

/// Replaces everything from the start of the token to the end of the line with `value`
///
/// Whatever precedes the token (indentation, key, list dash) is kept verbatim.
pub fn replace_token(line: &str, token: &Match, value: &str) -> String {
    format!("{}{}\n", &line[..token.token.start], value)
}

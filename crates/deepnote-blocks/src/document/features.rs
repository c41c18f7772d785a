//! Structural detection of anchors, aliases, merge keys and tags.
//!
//! The scan only looks at node positions: the start of a line (after any
//! `- ` sequence markers), after a `:` value indicator, and after `[`, `{`
//! and `,` inside flow collections. Lines that continue a multi-line plain
//! scalar are not node positions. `&`, `*` and `!` cannot start a plain
//! scalar in YAML, so seeing one there is always one of the banned features.
//! Quoted scalars, block scalar bodies and comments are skipped, which keeps
//! `*emphasis*` or `a&b` inside string content legal.

use std::fmt;

/// A YAML power feature that ingestion refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProhibitedFeature {
    Anchor,
    Alias,
    MergeKey,
    Tag,
}

impl fmt::Display for ProhibitedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProhibitedFeature::Anchor => "anchor",
            ProhibitedFeature::Alias => "alias",
            ProhibitedFeature::MergeKey => "merge-key",
            ProhibitedFeature::Tag => "tag",
        };
        write!(f, "{}", s)
    }
}

/// Where a prohibited feature was found (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLocation {
    pub feature: ProhibitedFeature,
    pub line: usize,
    pub column: usize,
}

/// Return the first prohibited feature in `text`, if any.
pub fn find_prohibited_feature(text: &str) -> Option<FeatureLocation> {
    let mut scanner = Scanner::default();
    for (idx, line) in text.lines().enumerate() {
        if let Some((feature, column)) = scanner.scan_line(line) {
            return Some(FeatureLocation {
                feature,
                line: idx + 1,
                column: column + 1,
            });
        }
    }
    None
}

#[derive(Default)]
struct Scanner {
    /// Open quote character of a quoted scalar continuing onto the next line.
    quote: Option<char>,
    /// Nesting depth of `[`/`{` flow collections.
    flow_depth: usize,
    /// Node-start state carried across lines inside flow collections.
    flow_node_start: bool,
    /// The last token is a plain scalar that has not ended yet.
    plain: bool,
    /// Block-context lines indented at least this far continue the open plain scalar.
    plain_continuation: Option<usize>,
    /// Lines indented deeper than this belong to a block scalar body.
    block_scalar_parent: Option<usize>,
}

impl Scanner {
    fn scan_line(&mut self, line: &str) -> Option<(ProhibitedFeature, usize)> {
        let chars: Vec<char> = line.chars().collect();
        let indent = chars.iter().take_while(|c| **c == ' ').count();
        let blank = indent == chars.len();

        if let Some(parent) = self.block_scalar_parent {
            if blank || indent > parent {
                return None;
            }
            self.block_scalar_parent = None;
        }

        let continuation = match self.plain_continuation {
            Some(_) if blank => return None,
            Some(min_indent)
                if indent >= min_indent
                    && chars[indent] != '#'
                    && !is_document_marker(&chars, indent) =>
            {
                true
            }
            Some(_) => {
                self.plain_continuation = None;
                self.plain = false;
                false
            }
            None => false,
        };

        let in_block_context = self.quote.is_none() && self.flow_depth == 0;
        let mut i = indent;
        let mut node_start = if continuation {
            false
        } else if in_block_context {
            true
        } else {
            self.flow_node_start
        };

        if in_block_context && !continuation {
            let rest: String = chars[indent..].iter().collect();
            if rest.starts_with('%') {
                return rest.starts_with("%TAG").then_some((ProhibitedFeature::Tag, indent));
            }
            if is_document_marker(&chars, indent) {
                i += 3;
            }
        }

        let mut owner_col = indent;
        // Column of the first node on the line and of the last `-`/`?` marker.
        let mut entry_col: Option<usize> = None;
        let mut marker_col: Option<usize> = None;
        let mut after_value_indicator = false;
        let mut plain_min_indent = self.plain_continuation;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if let Some(q) = self.quote {
                match (q, c) {
                    ('"', '\\') => {
                        i += 2;
                        continue;
                    }
                    ('\'', '\'') if next == Some('\'') => {
                        i += 2;
                        continue;
                    }
                    _ if c == q => self.quote = None,
                    _ => {}
                }
                i += 1;
                continue;
            }

            if c == ' ' || c == '\t' {
                i += 1;
                continue;
            }

            if c == '#' && (i == 0 || chars[i - 1].is_whitespace()) {
                self.plain = false;
                break;
            }

            if node_start {
                match c {
                    '&' => return Some((ProhibitedFeature::Anchor, i)),
                    '*' => return Some((ProhibitedFeature::Alias, i)),
                    '!' => return Some((ProhibitedFeature::Tag, i)),
                    '<' if is_merge_key(&chars[i..]) => {
                        return Some((ProhibitedFeature::MergeKey, i))
                    }
                    '-' | '?' if next.map_or(true, is_separator) => {
                        owner_col = i;
                        marker_col = Some(i);
                    }
                    // Inside a flow collection a `:` at a node position is
                    // always a value indicator.
                    ':' if next.map_or(true, is_separator) || self.flow_depth > 0 => {
                        after_value_indicator = true;
                    }
                    '[' | '{' => {
                        self.flow_depth += 1;
                        self.plain = false;
                        entry_col.get_or_insert(i);
                    }
                    ']' | '}' if self.flow_depth > 0 => {
                        self.flow_depth -= 1;
                        self.plain = false;
                        node_start = false;
                    }
                    '|' | '>' if self.flow_depth == 0 => {
                        self.plain = false;
                        self.plain_continuation = None;
                        self.block_scalar_parent = Some(owner_col);
                        return None;
                    }
                    '"' | '\'' => {
                        self.quote = Some(c);
                        self.plain = false;
                        entry_col.get_or_insert(i);
                        owner_col = i;
                        node_start = false;
                    }
                    _ => {
                        entry_col.get_or_insert(i);
                        if self.flow_depth == 0 {
                            // A plain value continues on lines indented past its
                            // mapping key or sequence marker.
                            plain_min_indent = Some(if after_value_indicator {
                                entry_col.or(marker_col).unwrap_or(indent) + 1
                            } else if let Some(marker) = marker_col {
                                marker + 1
                            } else {
                                i
                            });
                        }
                        self.plain = true;
                        owner_col = i;
                        node_start = false;
                    }
                }
                i += 1;
                continue;
            }

            match c {
                ':' if self.is_value_indicator(next) => {
                    after_value_indicator = true;
                    self.plain = false;
                    node_start = true;
                }
                ',' if self.flow_depth > 0 => {
                    self.plain = false;
                    node_start = true;
                }
                ']' | '}' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    self.plain = false;
                }
                _ => {}
            }
            i += 1;
        }

        self.flow_node_start = node_start;
        self.plain_continuation = if self.plain && self.flow_depth == 0 && self.quote.is_none() {
            plain_min_indent
        } else {
            None
        };
        None
    }

    /// Whether a `:` outside a node position separates a key from its value.
    ///
    /// Inside a plain scalar a `:` only ends the scalar when followed by a
    /// blank, or by a flow indicator inside a flow collection. After a quoted
    /// scalar or a closed collection it is an indicator whatever follows, as in
    /// `{"key":value}`.
    fn is_value_indicator(&self, next: Option<char>) -> bool {
        next.map_or(true, is_separator)
            || !self.plain
            || (self.flow_depth > 0 && matches!(next, Some(',' | '?' | '[' | ']' | '{' | '}')))
    }
}

/// `---` or `...` at the start of a line.
fn is_document_marker(chars: &[char], indent: usize) -> bool {
    if indent != 0 || chars.len() < 3 {
        return false;
    }
    let marker = &chars[..3];
    (marker == ['-', '-', '-'] || marker == ['.', '.', '.'])
        && chars.get(3).map_or(true, |c| c.is_whitespace())
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
}

/// `<<` followed by optional spaces and a `:` value indicator.
fn is_merge_key(chars: &[char]) -> bool {
    if chars.len() < 3 || chars[0] != '<' || chars[1] != '<' {
        return false;
    }
    let rest = &chars[2..];
    let spaces = rest.iter().take_while(|c| **c == ' ').count();
    match rest.get(spaces) {
        Some(':') => rest.get(spaces + 1).map_or(true, |c| is_separator(*c)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(text: &str) -> Option<ProhibitedFeature> {
        find_prohibited_feature(text).map(|f| f.feature)
    }

    #[test]
    fn test_anchor_in_value_position() {
        let yaml = "base: &defaults\n  a: 1\n";
        assert_eq!(feature(yaml), Some(ProhibitedFeature::Anchor));
    }

    #[test]
    fn test_alias_in_value_position() {
        let yaml = "a: 1\nb: *a\n";
        let found = find_prohibited_feature(yaml).unwrap();
        assert_eq!(found.feature, ProhibitedFeature::Alias);
        assert_eq!(found.line, 2);
        assert_eq!(found.column, 4);
    }

    #[test]
    fn test_alias_as_sequence_item() {
        let yaml = "items:\n  - *first\n";
        assert_eq!(feature(yaml), Some(ProhibitedFeature::Alias));
    }

    #[test]
    fn test_merge_key() {
        let yaml = "child:\n  <<: {a: 1}\n";
        assert_eq!(feature(yaml), Some(ProhibitedFeature::MergeKey));
        let spaced = "child:\n  << : {a: 1}\n";
        assert_eq!(feature(spaced), Some(ProhibitedFeature::MergeKey));
    }

    #[test]
    fn test_explicit_tags() {
        assert_eq!(feature("value: !!python/object foo\n"), Some(ProhibitedFeature::Tag));
        assert_eq!(feature("- !custom x\n"), Some(ProhibitedFeature::Tag));
        assert_eq!(feature("--- !doc\na: 1\n"), Some(ProhibitedFeature::Tag));
        assert_eq!(
            feature("%TAG ! tag:example.com,2000:\n---\na: 1\n"),
            Some(ProhibitedFeature::Tag)
        );
    }

    #[test]
    fn test_flow_collection_positions() {
        assert_eq!(feature("a: [1, *x]\n"), Some(ProhibitedFeature::Alias));
        assert_eq!(feature("a: {k: &x 1}\n"), Some(ProhibitedFeature::Anchor));
        assert_eq!(feature("a: [\n  1,\n  !t 2\n]\n"), Some(ProhibitedFeature::Tag));
    }

    #[test]
    fn test_trigger_characters_inside_content_are_legal() {
        let yaml = r#"
url: https://example.com/?a=1&b=2
emphasis: 'this is *bold*'
quoted: "&not_an_anchor *nor_alias !nor_tag"
math: 2 * 3 & 4
inline: a, *b
note: keep << this
"#;
        assert_eq!(feature(yaml), None);
    }

    #[test]
    fn test_block_scalar_body_is_skipped() {
        let yaml = "content: |-\n  *bold* & more\n  !important\n  <<: x\nnext: 1\n";
        assert_eq!(feature(yaml), None);

        let nested = "- id: a\n  content: |\n    &x\n  type: code\n- *b\n";
        let found = find_prohibited_feature(nested).unwrap();
        assert_eq!(found.feature, ProhibitedFeature::Alias);
        assert_eq!(found.line, 5);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(feature("a: 1 # &anchor *alias !tag\n# <<: x\n"), None);
    }

    #[test]
    fn test_multiline_quoted_scalar() {
        let yaml = "a: \"first line\n  *still string\"\nb: 2\n";
        assert_eq!(feature(yaml), None);
    }

    #[test]
    fn test_json_style_keys_without_space() {
        assert_eq!(
            feature("a: {\"b\":&x [1, 2], \"c\":*x}\n"),
            Some(ProhibitedFeature::Anchor)
        );
        assert_eq!(feature("{\"version\":!!str 1}\n"), Some(ProhibitedFeature::Tag));
        assert_eq!(feature("{'b':*x}\n"), Some(ProhibitedFeature::Alias));
        assert_eq!(feature("[{\"a\":1},\n {\"b\":\n  *x}]\n"), Some(ProhibitedFeature::Alias));
    }

    #[test]
    fn test_colon_inside_flow_plain_scalar() {
        assert_eq!(feature("a: {url: http://x.io/*y, b: c:d}\n"), None);
        assert_eq!(feature("a: [x:*y]\n"), None);
        assert_eq!(feature("a: [:*y]\n"), Some(ProhibitedFeature::Alias));
    }

    #[test]
    fn test_plain_scalar_continuation_lines() {
        assert_eq!(feature("content: first line\n  *second* line\n"), None);
        assert_eq!(feature("- first\n  &second !third\n- next\n"), None);
        assert_eq!(
            feature("- key: value\n    *more text\n\n    !and more\n  other: 1\n"),
            None
        );

        let ended = "content: first line\nnext: *x\n";
        let found = find_prohibited_feature(ended).unwrap();
        assert_eq!(found.feature, ProhibitedFeature::Alias);
        assert_eq!(found.line, 2);
    }

    #[test]
    fn test_continuation_stops_at_sibling_key() {
        let yaml = "- key: value\n  other: *x\n";
        assert_eq!(feature(yaml), Some(ProhibitedFeature::Alias));

        let after_comment = "a: b\n  # note\nc: &x 1\n";
        assert_eq!(feature(after_comment), Some(ProhibitedFeature::Anchor));

        let empty_value = "key:\n  *x\n";
        assert_eq!(feature(empty_value), Some(ProhibitedFeature::Alias));
    }

    #[test]
    fn test_display() {
        assert_eq!(ProhibitedFeature::MergeKey.to_string(), "merge-key");
        assert_eq!(ProhibitedFeature::Anchor.to_string(), "anchor");
    }
}

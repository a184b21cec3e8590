//! Ordered gitignore-style patterns read from the root `.flatpackredact` file.
//!
//! Each non-blank, non-comment line becomes one [`PatternRule`]. Rules keep
//! their file order; nothing is deduplicated or reordered, so contradictory
//! lines are resolved later by last-match-wins evaluation.
//!
//! Matching works on `/`-separated repo-relative paths:
//!
//! - A leading `!` negates the rule (it re-includes what earlier rules
//!   redacted).
//! - A leading `/` anchors the rule to the repository root.
//! - A trailing `/` restricts the rule to directories. A leaf file can then
//!   only be matched through one of its ancestor directories.
//! - An unanchored pattern without `/` is tested against every path segment.
//! - An unanchored pattern containing `/` is tested relative-path style but
//!   may start at any directory depth.
//! - `**` spans zero or more segments, `*` and `?` stay inside one segment,
//!   `[...]` classes and `\` escapes are supported.
//!
//! A rule that matches a directory matches everything below it.

use regex::{Regex, RegexBuilder};

use crate::error::{FlatpackError, Result};

/// What a matching rule does to an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Hide the body of matching entries
    Redact,
    /// Re-include matching entries (a `!` rule)
    Unredact,
}

/// How the compiled expression is applied to a candidate path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchScope {
    /// Full path from the root
    Anchored,
    /// Last segment of the candidate
    Segment,
    /// Full path, starting at any directory depth
    AnyDepth,
}

/// One rule from the control file
#[derive(Clone, Debug)]
pub struct PatternRule {
    raw: String,
    pattern: String,
    line: usize,
    negated: bool,
    anchored: bool,
    dir_only: bool,
    scope: MatchScope,
    regex: Regex,
}

impl PatternRule {
    /// Parses a single control-file line.
    ///
    /// Returns `Ok(None)` for blank lines and comments.
    pub fn parse(line_no: usize, line: &str) -> Result<Option<Self>> {
        let raw = trim_line(line);
        if raw.is_empty() || raw.starts_with('#') {
            return Ok(None);
        }

        let malformed = |reason: &str| FlatpackError::MalformedPattern {
            line: line_no,
            pattern: raw.clone(),
            reason: reason.to_string(),
        };

        let (negated, rest) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, raw.as_str()),
        };
        let (anchored, rest) = match rest.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let (dir_only, pattern) = match rest.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        if pattern.is_empty() {
            return Err(malformed("pattern is empty"));
        }
        if pattern.starts_with('/') || pattern.ends_with('/') || pattern.contains("//") {
            return Err(malformed("empty path segment"));
        }

        let scope = if anchored {
            MatchScope::Anchored
        } else if pattern.contains('/') {
            MatchScope::AnyDepth
        } else {
            MatchScope::Segment
        };

        let body = translate(pattern).map_err(|reason| malformed(&reason))?;
        let expr = match scope {
            MatchScope::AnyDepth => format!("^(?:.*/)?{}$", body),
            MatchScope::Anchored | MatchScope::Segment => format!("^{}$", body),
        };
        // Path names may contain newlines
        let regex = RegexBuilder::new(&expr)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| malformed(&e.to_string()))?;
        let pattern = pattern.to_string();

        Ok(Some(Self {
            raw,
            pattern,
            line: line_no,
            negated,
            anchored,
            dir_only,
            scope,
            regex,
        }))
    }

    /// The rule as written (surrounding whitespace trimmed)
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The pattern with `!`, leading `/` and trailing `/` stripped
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 1-based line number in the control file
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Whether the rule starts with `!`
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    /// Whether the rule starts with `/`
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether the rule ends with `/`
    #[must_use]
    pub const fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    /// Effect of the rule when it matches
    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        if self.negated {
            Polarity::Unredact
        } else {
            Polarity::Redact
        }
    }

    /// Whether the rule matches `path` or any of its ancestor directories.
    ///
    /// `is_dir` describes `path` itself; every proper prefix is a directory.
    #[must_use]
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        let mut end = 0;
        loop {
            let next = path[end..].find('/').map(|i| end + i);
            let (prefix, prefix_is_dir) = match next {
                Some(slash) => (&path[..slash], true),
                None => (path, is_dir),
            };

            if (!self.dir_only || prefix_is_dir) && self.matches_candidate(prefix) {
                return true;
            }

            match next {
                Some(slash) => end = slash + 1,
                None => return false,
            }
        }
    }

    fn matches_candidate(&self, candidate: &str) -> bool {
        match self.scope {
            MatchScope::Anchored | MatchScope::AnyDepth => self.regex.is_match(candidate),
            MatchScope::Segment => {
                let segment = candidate.rsplit('/').next().unwrap_or(candidate);
                self.regex.is_match(segment)
            }
        }
    }
}

/// Ordered, immutable collection of rules from one control file
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    rules: Vec<PatternRule>,
}

impl PatternSet {
    /// Parses control-file text into rules, keeping file order.
    ///
    /// # Errors
    ///
    /// Returns [`FlatpackError::MalformedPattern`] for the first line that
    /// cannot be compiled. Bad lines are never skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(rule) = PatternRule::parse(index + 1, line)? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// Parses pre-split lines, numbering them from 1.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            if let Some(rule) = PatternRule::parse(index + 1, line.as_ref())? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// Rules in evaluation order
    #[must_use]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when there are no rules, so everything is included
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Polarity of a single rule against a path, or `None` when it does not match
    #[must_use]
    pub fn match_rule(rule: &PatternRule, path: &str, is_dir: bool) -> Option<Polarity> {
        rule.matches(path, is_dir).then(|| rule.polarity())
    }
}

/// Trims leading whitespace and unescaped trailing whitespace.
fn trim_line(line: &str) -> String {
    let line = line.trim_start();
    let trimmed = line.trim_end();
    if trimmed.len() < line.len() && ends_with_escape(trimmed) {
        // `foo\ ` keeps its escaped space
        let mut kept = trimmed.to_string();
        kept.push(' ');
        return kept;
    }
    trimmed.to_string()
}

fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Translates a glob into a regex body over `/`-separated paths.
fn translate(pattern: &str) -> std::result::Result<String, String> {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len() - 1;
    let mut out = String::new();

    for (index, segment) in segments.iter().enumerate() {
        if *segment == "**" {
            if index == last {
                out.push_str(".*");
            } else {
                out.push_str("(?:.*/)?");
            }
            continue;
        }

        out.push_str(&translate_segment(segment)?);
        if index != last {
            out.push('/');
        }
    }

    Ok(out)
}

fn translate_segment(segment: &str) -> std::result::Result<String, String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // `**` inside a segment behaves like `*`
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
                out.push_str("[^/]*");
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                let (class, next) = translate_class(&chars, i)?;
                out.push_str(&class);
                i = next;
                continue;
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| "trailing backslash".to_string())?;
                out.push_str(&regex::escape(&escaped.to_string()));
                i += 1;
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    Ok(out)
}

/// Translates the class starting at `chars[start] == '['`, returning the regex
/// class and the index just past the closing `]`.
fn translate_class(chars: &[char], start: usize) -> std::result::Result<(String, usize), String> {
    let mut i = start + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut members = String::new();
    let mut first = true;
    loop {
        let c = *chars
            .get(i)
            .ok_or_else(|| "unterminated character class".to_string())?;
        if c == ']' && !first {
            break;
        }
        first = false;

        let literal = if c == '\\' {
            i += 1;
            *chars
                .get(i)
                .ok_or_else(|| "unterminated character class".to_string())?
        } else {
            c
        };

        if literal == '-' && c != '\\' && !members.is_empty() && chars.get(i + 1) != Some(&']') {
            members.push('-');
        } else {
            members.push_str(&regex::escape(&literal.to_string()));
        }
        i += 1;
    }

    if members.is_empty() {
        return Err("empty character class".to_string());
    }

    let class = if negated {
        format!("[^/{}]", members)
    } else {
        format!("[{}]", members)
    };
    Ok((class, i + 1))
}

/*!
 * Redaction decisions over the root `.flatpackredact` control file
 */

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::Result;
use crate::pattern::{PatternRule, PatternSet, Polarity};
use crate::utils::sha256_hex;

/// Name of the control file. Only the copy at the repository root is read.
pub const REDACT_FILE_NAME: &str = ".flatpackredact";

/// Verdict for one entry
#[derive(Clone, Copy, Debug)]
pub enum Decision<'a> {
    /// Body is emitted. Carries the `!` rule that re-included the path, if any.
    Include(Option<&'a PatternRule>),
    /// Body is withheld because of the given rule
    Redact(&'a PatternRule),
}

impl<'a> Decision<'a> {
    /// Whether the body should be withheld
    #[must_use]
    pub fn is_redacted(&self) -> bool {
        matches!(self, Decision::Redact(_))
    }

    /// The rule that decided the verdict, if any rule matched
    #[must_use]
    pub fn rule(&self) -> Option<&'a PatternRule> {
        match *self {
            Decision::Include(rule) => rule,
            Decision::Redact(rule) => Some(rule),
        }
    }
}

/// Renders as the tag used in documents: `[include]` or `[redact:<rule>]`
impl fmt::Display for Decision<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Include(_) => write!(f, "[include]"),
            Decision::Redact(rule) => write!(f, "[redact:{}]", rule.raw()),
        }
    }
}

/// Decides whether `path` is redacted.
///
/// Every rule is evaluated in file order and the last one that matches sets the
/// verdict. With no matching rule the entry is included.
#[must_use]
pub fn decide<'a>(path: &str, is_dir: bool, patterns: &'a PatternSet) -> Decision<'a> {
    let mut decision = Decision::Include(None);
    for rule in patterns.rules() {
        match PatternSet::match_rule(rule, path, is_dir) {
            Some(Polarity::Redact) => decision = Decision::Redact(rule),
            Some(Polarity::Unredact) => decision = Decision::Include(Some(rule)),
            None => {}
        }
    }
    decision
}

/// The control file as found on disk
#[derive(Clone, Debug, Default)]
pub struct RedactFile {
    /// SHA-256 of the raw file bytes; `None` when the file is absent
    pub hash: Option<String>,
    /// Parsed rules (empty when absent)
    pub patterns: PatternSet,
}

impl RedactFile {
    /// Loads `<repo_root>/.flatpackredact`.
    ///
    /// A missing file, or a path that is not a regular file, yields an empty
    /// rule set. A file that exists but cannot be read, or holds a malformed
    /// pattern, is an error.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(REDACT_FILE_NAME);
        if path.exists() && !path.is_file() {
            warn!("{} is not a regular file, treating it as absent", path.display());
            return Ok(Self::default());
        }
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} absent in {}", REDACT_FILE_NAME, repo_root.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let redact = Self::from_bytes(&raw)?;
        info!(
            "Loaded {} redaction rule(s) from {}",
            redact.patterns.len(),
            path.display()
        );
        Ok(redact)
    }

    /// Builds a found control file from its raw bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let patterns = PatternSet::parse(&String::from_utf8_lossy(raw))?;
        Ok(Self {
            hash: Some(sha256_hex(raw)),
            patterns,
        })
    }

    /// Whether the control file exists
    #[must_use]
    pub fn found(&self) -> bool {
        self.hash.is_some()
    }

    /// Decides an entry against the loaded rules
    #[must_use]
    pub fn decide(&self, path: &str, is_dir: bool) -> Decision<'_> {
        decide(path, is_dir, &self.patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlatpackError;

    fn set(lines: &[&str]) -> PatternSet {
        PatternSet::from_lines(lines).expect("patterns compile")
    }

    fn tag(path: &str, patterns: &PatternSet) -> String {
        decide(path, false, patterns).to_string()
    }

    #[test]
    fn no_rules_includes_by_default() {
        let patterns = set(&[]);
        let decision = decide("foo.txt", false, &patterns);
        assert!(!decision.is_redacted());
        assert!(decision.rule().is_none());
        assert_eq!(decision.to_string(), "[include]");
    }

    #[test]
    fn simple_redact() {
        let patterns = set(&["*.txt"]);
        assert_eq!(tag("foo.txt", &patterns), "[redact:*.txt]");
    }

    #[test]
    fn last_match_wins() {
        let patterns = set(&["*.md", "!README.md"]);
        let decision = decide("README.md", false, &patterns);
        assert!(!decision.is_redacted());
        assert_eq!(decision.rule().map(|r| r.raw()), Some("!README.md"));
        assert_eq!(tag("CHANGELOG.md", &patterns), "[redact:*.md]");

        let reversed = set(&["!README.md", "*.md"]);
        assert_eq!(tag("README.md", &reversed), "[redact:*.md]");
    }

    #[test]
    fn exact_rule_after_negation_redacts_again() {
        let patterns = set(&["*.txt", "!foo.txt", "foo.txt"]);
        let decision = decide("foo.txt", false, &patterns);
        assert!(decision.is_redacted());
        assert_eq!(decision.rule().map(|r| r.line()), Some(3));
    }

    #[test]
    fn directory_rule_reaches_nested_files() {
        let patterns = set(&["data/"]);
        assert_eq!(tag("data/file.bin", &patterns), "[redact:data/]");
        assert_eq!(tag("data/sub/n.txt", &patterns), "[redact:data/]");
        assert_eq!(tag("other/file.txt", &patterns), "[include]");
        assert_eq!(tag("data", &patterns), "[include]");
    }

    #[test]
    fn negation_inside_redacted_directory() {
        let patterns = set(&["*.txt", "!foo/keep.txt"]);
        assert!(!decide("foo/keep.txt", false, &patterns).is_redacted());
        assert!(decide("foo/drop.txt", false, &patterns).is_redacted());
    }

    #[test]
    fn gitwildmatch_cases() {
        let cases: &[(&str, &[&str], bool)] = &[
            ("foo/bar.txt", &["*.txt"], true),
            ("foo/bar.txt", &["*.md"], false),
            ("foo/bar.txt", &["bar.txt"], true),
            ("foo/bar.txt", &["baz.txt"], false),
            ("foo/bar.txt", &["foo/*.txt"], true),
            ("foo/bar.txt", &["/foo/bar.txt"], true),
            ("foo/bar.txt", &["/bar.txt"], false),
            ("foo/bar/baz.txt", &["foo/"], true),
            ("foo/bar/baz.txt", &["/foo/"], true),
            ("foo/bar/baz.txt", &["bar/"], true),
            ("foo/bar/baz.txt", &["baz/"], false),
            ("foo/bar/baz.txt", &["**/baz.txt"], true),
            ("foo/keep.txt", &["*.txt", "!foo/keep.txt"], false),
        ];

        for (path, lines, redacted) in cases {
            let patterns = set(lines);
            assert_eq!(
                decide(path, false, &patterns).is_redacted(),
                *redacted,
                "{} against {:?}",
                path,
                lines
            );
        }
    }

    #[test]
    fn decide_is_deterministic() {
        let patterns = set(&["*.md", "!README.md", "docs/", "/secret.txt"]);
        for path in ["README.md", "docs/a.md", "secret.txt", "src/secret.txt", "x"] {
            let first = decide(path, false, &patterns).to_string();
            for _ in 0..3 {
                assert_eq!(decide(path, false, &patterns).to_string(), first);
            }
        }
    }

    #[test]
    fn load_absent_file_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let redact = RedactFile::load(dir.path())?;
        assert!(!redact.found());
        assert!(redact.patterns.is_empty());
        assert!(!redact.decide("anything", false).is_redacted());
        Ok(())
    }

    #[test]
    fn load_directory_control_path_is_absent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join(REDACT_FILE_NAME))?;

        let redact = RedactFile::load(dir.path())?;
        assert!(!redact.found());
        assert!(redact.patterns.is_empty());
        Ok(())
    }

    #[test]
    fn load_hashes_raw_bytes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let body = b"# secrets\n*.md\n!README.md\n";
        fs::write(dir.path().join(REDACT_FILE_NAME), body)?;

        let redact = RedactFile::load(dir.path())?;
        assert!(redact.found());
        assert_eq!(redact.hash.as_deref(), Some(sha256_hex(body).as_str()));
        assert_eq!(redact.patterns.len(), 2);
        Ok(())
    }

    #[test]
    fn only_root_control_file_is_read() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("sub"))?;
        fs::write(dir.path().join("sub").join(REDACT_FILE_NAME), "*\n")?;

        let redact = RedactFile::load(dir.path())?;
        assert!(!redact.found());
        assert!(!redact.decide("sub/file.txt", false).is_redacted());
        Ok(())
    }

    #[test]
    fn malformed_control_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(REDACT_FILE_NAME), "*.md\n[oops\n")?;

        match RedactFile::load(dir.path()) {
            Err(FlatpackError::MalformedPattern { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed pattern, got {:?}", other.map(|r| r.hash)),
        }
        Ok(())
    }
}

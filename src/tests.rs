/*!
 * Tests for flatpack functionality
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::tempdir;

use crate::collector::EntryCollector;
use crate::git::ListedSource;
use crate::redact::{RedactFile, REDACT_FILE_NAME};
use crate::snapshot::{strip_generated_line, SnapshotBuilder, SnapshotOptions};
use crate::types::Entry;

// Helper function to create a work tree with a fixed classification
fn setup_work_tree(control: Option<&str>) -> io::Result<(tempfile::TempDir, ListedSource)> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();

    let files: [(&str, &[u8]); 6] = [
        ("README.md", b"# readme\n"),
        ("CHANGELOG.md", b"## 0.1.0\n"),
        ("notes.txtmd", b"not markdown\n"),
        ("src/main.rs", b"fn main() {}\n"),
        ("scratch.txt", b"untracked scratch\n"),
        ("vendor/lib/inner.rs", b"submodule internals\n"),
    ];
    for (path, body) in files {
        let abs = root.join(path);
        fs::create_dir_all(abs.parent().unwrap_or(root))?;
        File::create(abs)?.write_all(body)?;
    }

    if let Some(control) = control {
        fs::write(root.join(REDACT_FILE_NAME), control)?;
    }

    let mut source = ListedSource::new(root);
    source.tracked = vec![
        "CHANGELOG.md".into(),
        "README.md".into(),
        "notes.txtmd".into(),
        "src/main.rs".into(),
    ];
    source.untracked = vec!["scratch.txt".into()];
    source.submodules = vec!["vendor/lib".into()];
    if control.is_some() {
        source.untracked.push(REDACT_FILE_NAME.into());
    }

    Ok((temp_dir, source))
}

fn collect(source: ListedSource) -> Vec<Entry> {
    EntryCollector::new(source, true, Arc::new(ProgressBar::hidden()))
        .collect()
        .unwrap()
}

fn options(generated_at: Option<&str>) -> SnapshotOptions {
    SnapshotOptions {
        root_name: "work".to_string(),
        include_untracked: true,
        generated_at: generated_at.map(str::to_string),
    }
}

fn plan(root: &Path, entries: &[Entry]) -> String {
    let redact = RedactFile::load(root).unwrap();
    let mut out = Vec::new();
    SnapshotBuilder::new(root, &redact, options(None))
        .build_plan(entries, &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn dump(root: &Path, entries: &[Entry], generated_at: Option<&str>) -> String {
    let redact = RedactFile::load(root).unwrap();
    let mut out = Vec::new();
    SnapshotBuilder::new(root, &redact, options(generated_at))
        .build_full_dump(entries, &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_empty_control_file_includes_everything() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some(""))?;
    let entries = collect(source);
    let plan = plan(temp_dir.path(), &entries);

    assert!(plan.contains("Redact-File: .flatpackredact (found)"));
    for entry in entries.iter().filter(|e| e.path != "vendor/lib") {
        assert!(
            plan.contains(&format!("[include] {}\n", entry.path)),
            "{} should be included",
            entry.path
        );
    }
    assert!(!plan.contains("[redact:"));
    Ok(())
}

#[test]
fn test_extension_rule_redacts_both_markdown_files() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some("*.md\n"))?;
    let entries = collect(source);
    let plan = plan(temp_dir.path(), &entries);

    assert!(plan.contains("[redact:*.md] README.md\n"));
    assert!(plan.contains("[redact:*.md] CHANGELOG.md\n"));
    assert!(plan.contains("[include] notes.txtmd\n"));
    Ok(())
}

#[test]
fn test_negation_reincludes_readme() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some("*.md\n!README.md\n"))?;
    let entries = collect(source);
    let plan = plan(temp_dir.path(), &entries);

    assert!(plan.contains("[include] README.md\n"));
    assert!(plan.contains("[redact:*.md] CHANGELOG.md\n"));

    let dump = dump(temp_dir.path(), &entries, None);
    assert!(dump.contains("# readme\n"));
    assert!(!dump.contains("## 0.1.0"));
    assert!(dump.contains("<redacted: *.md>"));
    Ok(())
}

#[test]
fn test_submodule_is_a_single_leaf() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(None)?;
    let entries = collect(source);

    let submodules: Vec<&Entry> = entries.iter().filter(|e| e.path.starts_with("vendor")).collect();
    assert_eq!(submodules, vec![&Entry::submodule("vendor/lib")]);

    let dump = dump(temp_dir.path(), &entries, None);
    assert!(dump.contains("Redact-File: .flatpackredact (absent)"));
    assert!(dump.contains("Path: vendor/lib\nKind: submodule\n"));
    assert!(dump.contains("Size: 0\nHash: -\n"));
    assert!(!dump.contains("submodule internals"));
    Ok(())
}

#[test]
fn test_submodule_ignores_redaction_rules() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some("vendor/\n*\n"))?;
    let entries = collect(source);

    let plan = plan(temp_dir.path(), &entries);
    assert!(plan.contains("[redact:*] vendor/lib\n"));
    assert!(plan.contains("└── lib [S] (0B)\n"));

    let dump = dump(temp_dir.path(), &entries, None);
    assert!(dump.contains("Path: vendor/lib\nKind: submodule\nMode: -\nEncoding: -\nSize: 0\nHash: -\n"));
    assert!(dump.contains(&format!(
        "Decision: [redact:*]\n{}\n<submodule: not expanded>\n",
        crate::snapshot::SEP_CONTENT
    )));
    assert!(!dump.contains("submodule internals"));
    Ok(())
}

#[test]
fn test_tree_summary_counts() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(None)?;
    let entries = collect(source);
    let plan = plan(temp_dir.path(), &entries);

    assert!(plan.contains("Files: 6   Tracked: 4   Untracked: 1   Submodules: 1\n"));
    assert!(plan.contains("├── src/\n│   └── main.rs [T] (13B)\n"));
    assert!(plan.contains("└── vendor/\n    └── lib [S] (0B)\n"));
    Ok(())
}

#[test]
fn test_output_is_identical_apart_from_timestamp() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some("src/\n"))?;
    let first = dump(temp_dir.path(), &collect(source.clone()), Some("2024-01-01T00:00:00+00:00"));
    let second = dump(temp_dir.path(), &collect(source), Some("2025-06-30T12:00:00+02:00"));

    assert_ne!(first, second);
    assert_eq!(strip_generated_line(&first), strip_generated_line(&second));
    Ok(())
}

#[test]
fn test_control_file_change_changes_header_hash() -> io::Result<()> {
    let (temp_dir, source) = setup_work_tree(Some("*.md\n"))?;
    let before = plan(temp_dir.path(), &collect(source.clone()));

    fs::write(temp_dir.path().join(REDACT_FILE_NAME), "*.rs\n")?;
    let after = plan(temp_dir.path(), &collect(source));

    let hash_line = |doc: &str| {
        doc.lines()
            .find(|l| l.starts_with("Redact-File-Hash:"))
            .map(str::to_string)
    };
    assert_ne!(hash_line(&before), hash_line(&after));
    assert!(after.contains("[redact:*.rs] src/main.rs\n"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_abort() -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let (temp_dir, source) = setup_work_tree(None)?;
    let locked = temp_dir.path().join("src/main.rs");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can still read the file
    if File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
        return Ok(());
    }

    let entries = collect(source);
    let dump = dump(temp_dir.path(), &entries, None);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;

    assert!(dump.contains("Path: src/main.rs\n"));
    assert!(dump.contains("Warning: Unreadable file src/main.rs"));
    assert!(dump.contains("<unreadable: "));
    assert!(dump.contains("# readme\n"));
    Ok(())
}

#[test]
fn test_unicode_and_spaced_names() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let mut source = ListedSource::new(temp_dir.path());
    for name in ["docs/résumé.md", "with space.txt", "日本語.txt"] {
        let abs = temp_dir.path().join(name);
        fs::create_dir_all(abs.parent().unwrap_or(temp_dir.path()))?;
        fs::write(abs, name)?;
        source.tracked.push(name.to_string());
    }

    let entries = collect(source);
    let plan = plan(temp_dir.path(), &entries);
    assert!(plan.contains("[include] docs/résumé.md\n"));
    assert!(plan.contains("[include] with space.txt\n"));
    assert!(plan.contains("[include] 日本語.txt\n"));
    Ok(())
}

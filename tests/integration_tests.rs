use softsort::cli::{SelectionSpec, Session, SortCommand, run_cli_with_config};
use softsort::config::SortConfig;
use softsort::operation_log::{LogAction, LogStatus};
use softsort::{
    MoveStatus, OperationLog, Selection, classify, cleanup_empty_dirs, compile_rules,
    execute_moves,
};
/// Integration tests for softsort
///
/// These tests run the whole pipeline against real temporary directories:
/// rule compilation, classification, preview, moving and cleanup.
///
/// Test categories:
/// 1. Classification scenarios
/// 2. Moving and collision handling
/// 3. Partial selection
/// 4. Cleanup
/// 5. CLI sessions
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary scan root plus a separate directory for the rule file, so
/// the rule file itself is never a sort candidate.
struct TestFixture {
    root: TempDir,
    aux: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            root: TempDir::new().expect("Failed to create temp directory"),
            aux: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn create_file(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, rel_path).expect("Failed to write file");
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name);
        }
    }

    fn create_dir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create directory");
    }

    fn write_rules(&self, source: &str) -> PathBuf {
        let path = self.aux.path().join("category_rules.txt");
        fs::write(&path, source).expect("Failed to write rule file");
        path
    }

    fn session(&self, rules: &str, command: SortCommand) -> Session {
        Session {
            root: self.path().to_path_buf(),
            rule_file: self.write_rules(rules),
            command,
            history: None,
        }
    }

    fn assert_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.exists(), "Should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Should not exist: {}", path.display());
    }

    /// Immediate entry names of the root, sorted.
    fn top_level(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

const SOFTWARE_RULES: &str = "\
# Rules for the software share
# target_dir: system_tools
driver|bios
hp|lenovo|dell

# target_dir: office_tools
office|wps

# target_dir: dev_tools
git|python|node
";

// ============================================================================
// Test Suite 1: Classification
// ============================================================================

#[test]
fn test_documented_classification_scenario() {
    let fixture = TestFixture::new();
    fixture.create_files(&["driver_v2.exe", "office365setup.exe", "unknown_tool.zip"]);
    let (rules, warnings) = compile_rules("# target_dir: system_tools\ndriver|bios\n# target_dir: office_tools\noffice\n");
    assert!(warnings.is_empty());

    let preview = classify(fixture.path(), &rules).unwrap();
    let categories: Vec<_> = preview
        .entries()
        .iter()
        .map(|e| (e.result.entry.name.as_str(), e.result.category.as_str()))
        .collect();

    assert_eq!(
        categories,
        vec![
            ("driver_v2.exe", "system_tools"),
            ("office365setup.exe", "office_tools"),
            ("unknown_tool.zip", "install_misc"),
        ]
    );
    assert!(preview.entries()[2].result.is_fallback());
}

#[test]
fn test_reordering_blocks_changes_category() {
    let fixture = TestFixture::new();
    fixture.create_file("hp_office_jet_driver.exe");

    let (forward, _) = compile_rules("# target_dir: system_tools\nhp\n# target_dir: office_tools\noffice\n");
    let (reversed, _) = compile_rules("# target_dir: office_tools\noffice\n# target_dir: system_tools\nhp\n");

    let a = classify(fixture.path(), &forward).unwrap();
    let b = classify(fixture.path(), &reversed).unwrap();
    assert_eq!(a.entries()[0].result.category, "system_tools");
    assert_eq!(b.entries()[0].result.category, "office_tools");
}

#[test]
fn test_preview_is_repeatable_and_read_only() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Git-2.44-64-bit.exe", "WPS_Office.exe", "random.iso"]);
    let (rules, _) = compile_rules(SOFTWARE_RULES);
    let before = fixture.top_level();

    let first = classify(fixture.path(), &rules).unwrap();
    let second = classify(fixture.path(), &rules).unwrap();

    assert_eq!(first.entries(), second.entries());
    assert_eq!(first.counts_by_category(), second.counts_by_category());
    assert_eq!(fixture.top_level(), before);
}

#[test]
fn test_invalid_pattern_does_not_block_other_rules() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe", "office.exe"]);
    let (rules, warnings) = compile_rules("# target_dir: dev_tools\n(git\ngit\n# target_dir: office_tools\noffice\n");

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line, 2);
    let preview = classify(fixture.path(), &rules).unwrap();
    assert_eq!(preview.counts_by_category().get("dev_tools"), Some(&1));
    assert_eq!(preview.counts_by_category().get("office_tools"), Some(&1));
}

#[test]
fn test_sorted_category_dirs_are_not_reclassified() {
    let fixture = TestFixture::new();
    fixture.create_file("office_tools/office2019.exe");
    fixture.create_file("node-v20.msi");
    let (rules, _) = compile_rules(SOFTWARE_RULES);

    let preview = classify(fixture.path(), &rules).unwrap();
    let names: Vec<_> = preview.entries().iter().map(|e| e.result.entry.name.as_str()).collect();
    assert_eq!(names, vec!["node-v20.msi"]);
}

#[test]
fn test_invalid_root_is_fatal() {
    let (rules, _) = compile_rules(SOFTWARE_RULES);
    assert!(classify(Path::new("/non/existent/software"), &rules).is_err());
}

// ============================================================================
// Test Suite 2: Moving
// ============================================================================

#[test]
fn test_move_all_preserves_leaf_names() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Lenovo_Vantage.exe", "python-3.12.exe", "misc.7z"]);
    fixture.create_file("PortableGit/bin/git.exe");
    let (rules, _) = compile_rules(SOFTWARE_RULES);
    let preview = classify(fixture.path(), &rules).unwrap();
    let mut log = OperationLog::new();

    let outcomes = execute_moves(&preview, &Selection::All, &mut log);

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert_eq!(outcome.status, MoveStatus::Moved);
        assert_eq!(
            outcome.destination.file_name(),
            outcome.result.entry.source_path.file_name()
        );
        assert!(outcome.destination.exists());
        assert!(!outcome.result.entry.source_path.exists());
    }
    fixture.assert_exists("dev_tools/PortableGit/bin/git.exe");
    fixture.assert_exists("system_tools/Lenovo_Vantage.exe");
    fixture.assert_exists("install_misc/misc.7z");
    assert_eq!(log.len(), 4);
    assert!(log.iter().all(|r| r.action == LogAction::Move && r.status == LogStatus::Moved));
}

#[test]
fn test_existing_destination_is_skipped_and_source_kept() {
    let fixture = TestFixture::new();
    fixture.create_file("office365setup.exe");
    fs::create_dir(fixture.path().join("office_tools")).unwrap();
    fs::write(fixture.path().join("office_tools/office365setup.exe"), "already sorted").unwrap();
    let (rules, _) = compile_rules("# target_dir: system_tools\ndriver|bios\n# target_dir: office_tools\noffice\n");

    let preview = classify(fixture.path(), &rules).unwrap();
    assert!(preview.entries()[0].conflict);
    let mut log = OperationLog::new();
    let outcomes = execute_moves(&preview, &Selection::All, &mut log);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, MoveStatus::SkippedExists);
    fixture.assert_exists("office365setup.exe");
    assert_eq!(
        fs::read_to_string(fixture.path().join("office_tools/office365setup.exe")).unwrap(),
        "already sorted"
    );
    assert_eq!(log.records()[0].status, LogStatus::SkippedExists);
}

#[test]
fn test_second_run_sorts_only_remainder() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe", "office.exe"]);
    let (rules, _) = compile_rules(SOFTWARE_RULES);

    let preview = classify(fixture.path(), &rules).unwrap();
    let mut log = OperationLog::new();
    execute_moves(&preview, &Selection::indices([0]), &mut log);

    let again = classify(fixture.path(), &rules).unwrap();
    let names: Vec<_> = again.entries().iter().map(|e| e.result.entry.name.as_str()).collect();
    assert_eq!(names, vec!["office.exe"]);
}

// ============================================================================
// Test Suite 3: Partial Selection
// ============================================================================

#[test]
fn test_non_contiguous_selection_moves_only_selected() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a_git.exe", "b_office.exe", "c_bios.bin", "d_node.msi"]);
    let (rules, _) = compile_rules(SOFTWARE_RULES);
    let preview = classify(fixture.path(), &rules).unwrap();
    let mut log = OperationLog::new();

    let outcomes = execute_moves(&preview, &Selection::indices([3, 0, 2]), &mut log);

    let moved: Vec<_> = outcomes.iter().map(|o| o.result.entry.name.as_str()).collect();
    assert_eq!(moved, vec!["a_git.exe", "c_bios.bin", "d_node.msi"]);
    fixture.assert_exists("b_office.exe");
    fixture.assert_not_exists("office_tools");
}

#[test]
fn test_empty_selection_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe", "office.exe"]);
    let (rules, _) = compile_rules(SOFTWARE_RULES);
    let preview = classify(fixture.path(), &rules).unwrap();
    let before = fixture.top_level();
    let mut log = OperationLog::new();

    let outcomes = execute_moves(&preview, &Selection::none(), &mut log);

    assert!(outcomes.is_empty());
    assert!(log.is_empty());
    assert_eq!(fixture.top_level(), before);
}

// ============================================================================
// Test Suite 4: Cleanup
// ============================================================================

#[test]
fn test_cleanup_after_move() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe"]);
    fixture.create_dir("leftover_empty");
    fixture.create_file("keep_me/readme.txt");
    fixture.create_dir("nested/deeper_empty");
    let (rules, _) = compile_rules(SOFTWARE_RULES);

    let preview = classify(fixture.path(), &rules).unwrap();
    let selection = Selection::categories(&preview, ["dev_tools"]);
    let mut log = OperationLog::new();
    execute_moves(&preview, &selection, &mut log);

    let removed = cleanup_empty_dirs(fixture.path()).unwrap();

    assert_eq!(removed, 1);
    fixture.assert_not_exists("leftover_empty");
    fixture.assert_exists("keep_me/readme.txt");
    fixture.assert_exists("nested/deeper_empty");
    fixture.assert_exists("dev_tools/git.exe");
}

// ============================================================================
// Test Suite 5: CLI Sessions
// ============================================================================

#[test]
fn test_cli_preview_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe", "office.exe"]);
    let session = fixture.session(SOFTWARE_RULES, SortCommand::Preview);

    let report = run_cli_with_config(&session, &SortConfig::default()).unwrap();

    assert_eq!(report.preview.len(), 2);
    assert!(report.outcomes.is_empty());
    assert_eq!(fixture.top_level(), vec!["git.exe", "office.exe"]);
    assert!(report.log.iter().all(|r| r.action == LogAction::Classify));
}

#[test]
fn test_cli_run_with_category_selection_and_cleanup() {
    let fixture = TestFixture::new();
    fixture.create_files(&["git.exe", "node.msi", "office.exe"]);
    fixture.create_dir("old_empty");
    let session = fixture.session(
        SOFTWARE_RULES,
        SortCommand::Run {
            selection: SelectionSpec {
                indices: Vec::new(),
                categories: vec!["dev_tools".to_string()],
            },
            cleanup: true,
        },
    );

    let report = run_cli_with_config(&session, &SortConfig::default()).unwrap();

    assert_eq!(report.count(MoveStatus::Moved), 2);
    assert_eq!(report.removed_dirs, vec![fixture.path().join("old_empty")]);
    assert_eq!(fixture.top_level(), vec!["dev_tools", "office.exe"]);
    assert!(
        report
            .log
            .iter()
            .any(|r| r.action == LogAction::Cleanup && r.status == LogStatus::Removed)
    );
}

#[test]
fn test_cli_custom_fallback_and_history() {
    let fixture = TestFixture::new();
    fixture.create_file("mystery.bin");
    let history = fixture.aux.path().join("history.jsonl");
    let mut session = fixture.session(
        SOFTWARE_RULES,
        SortCommand::Run {
            selection: SelectionSpec::default(),
            cleanup: false,
        },
    );
    session.history = Some(history.clone());
    let config = SortConfig {
        fallback_category: "unsorted".to_string(),
        ..Default::default()
    };

    let report = run_cli_with_config(&session, &config).unwrap();

    assert_eq!(report.count(MoveStatus::Moved), 1);
    fixture.assert_exists("unsorted/mystery.bin");
    let lines = fs::read_to_string(&history).unwrap();
    // One classify record and one move record
    assert_eq!(lines.lines().count(), 2);
}

#[test]
fn test_cli_missing_rule_file_is_error() {
    let fixture = TestFixture::new();
    let session = Session {
        root: fixture.path().to_path_buf(),
        rule_file: fixture.aux.path().join("missing.txt"),
        command: SortCommand::Preview,
        history: None,
    };
    assert!(run_cli_with_config(&session, &SortConfig::default()).is_err());
}

#[test]
fn test_cli_invalid_root_is_error() {
    let fixture = TestFixture::new();
    let mut session = fixture.session(SOFTWARE_RULES, SortCommand::Preview);
    session.root = fixture.path().join("does_not_exist");
    let result = run_cli_with_config(&session, &SortConfig::default());
    assert!(result.unwrap_err().contains("Invalid scan root"));
}

#[test]
fn test_cli_fallback_outside_root_is_error() {
    let fixture = TestFixture::new();
    fixture.create_file("mystery.bin");
    let session = fixture.session(
        SOFTWARE_RULES,
        SortCommand::Run {
            selection: SelectionSpec::default(),
            cleanup: false,
        },
    );
    let config = SortConfig {
        fallback_category: "../escaped".to_string(),
        ..Default::default()
    };

    let result = run_cli_with_config(&session, &config);

    assert!(result.unwrap_err().contains("Invalid fallback category"));
    fixture.assert_exists("mystery.bin");
    assert!(!fixture.path().join("../escaped").exists());
}

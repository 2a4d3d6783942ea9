//! Source rules for the board engine.
//!
//! The engine runs inside someone else's runtime and UI loop, so library code
//! must not crash, block the executor, write to the terminal or install a
//! global subscriber. Only `main.rs` may do the last two.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, PartialEq)]
enum Scope {
    /// Every production file, binary included.
    Everywhere,
    /// Library modules only; `main.rs` is exempt.
    Library,
}

struct Rule {
    pattern: &'static str,
    scope: Scope,
    reason: &'static str,
}

const RULES: &[Rule] = &[
    Rule { pattern: ".unwrap()", scope: Scope::Everywhere, reason: "propagate with `?` or recover" },
    Rule { pattern: ".expect(", scope: Scope::Everywhere, reason: "propagate with `?` or recover" },
    Rule { pattern: "panic!(", scope: Scope::Everywhere, reason: "surface an EditorError instead" },
    Rule { pattern: "unreachable!(", scope: Scope::Everywhere, reason: "make the state unrepresentable" },
    Rule { pattern: "todo!(", scope: Scope::Everywhere, reason: "unfinished code" },
    Rule { pattern: "unimplemented!(", scope: Scope::Everywhere, reason: "unfinished code" },
    Rule { pattern: "let _ =", scope: Scope::Everywhere, reason: "inspect or log the discarded result" },
    Rule { pattern: ".ok()", scope: Scope::Everywhere, reason: "inspect or log the discarded error" },
    Rule { pattern: "#[allow(dead_code)]", scope: Scope::Everywhere, reason: "delete unused code" },
    Rule { pattern: "std::thread::sleep", scope: Scope::Everywhere, reason: "blocks the async executor; use tokio::time" },
    Rule { pattern: "block_on(", scope: Scope::Library, reason: "controller calls already run on the runtime" },
    Rule { pattern: "println!(", scope: Scope::Library, reason: "report through tracing or a Notice" },
    Rule { pattern: "eprintln!(", scope: Scope::Library, reason: "report through tracing or a Notice" },
    Rule { pattern: "tracing_subscriber", scope: Scope::Library, reason: "the embedding binary owns the subscriber" },
];

struct SourceFile {
    path: PathBuf,
    content: String,
}

impl SourceFile {
    fn is_binary(&self) -> bool {
        self.path.file_name().is_some_and(|name| name == "main.rs")
    }

    /// Lines that are code, with their 1-based numbers. Comment lines are skipped.
    fn code_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim_start().starts_with("//"))
            .map(|(index, line)| (index + 1, line))
    }
}

/// Production sources under `src/`. Test modules and the recording store are left out.
fn production_sources() -> Vec<SourceFile> {
    let mut files = Vec::new();
    walk(Path::new("src"), &mut files);
    files
}

fn walk(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_test_only = name.ends_with("_test.rs") || name == "test_helpers.rs";
        if !name.ends_with(".rs") || is_test_only {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path, content });
        }
    }
}

fn violations(files: &[SourceFile], rule: &Rule) -> Vec<String> {
    files
        .iter()
        .filter(|file| rule.scope == Scope::Everywhere || !file.is_binary())
        .flat_map(|file| {
            file.code_lines()
                .filter(|(_, line)| line.contains(rule.pattern))
                .map(|(number, line)| format!("  {}:{number}: {}", file.path.display(), line.trim()))
        })
        .collect()
}

#[test]
fn production_sources_follow_engine_rules() {
    let files = production_sources();
    let report: Vec<String> = RULES
        .iter()
        .filter_map(|rule| {
            let hits = violations(&files, rule);
            (!hits.is_empty()).then(|| format!("`{}` ({}):\n{}", rule.pattern, rule.reason, hits.join("\n")))
        })
        .collect();
    assert!(report.is_empty(), "engine source rules violated:\n{}", report.join("\n"));
}

#[test]
fn library_rules_exempt_only_the_binary() {
    let files = vec![
        SourceFile { path: PathBuf::from("src/main.rs"), content: "println!(\"{x}\");".into() },
        SourceFile { path: PathBuf::from("src/controller.rs"), content: "println!(\"{x}\");".into() },
    ];
    let rule = RULES.iter().find(|rule| rule.pattern == "println!(").map(|rule| violations(&files, rule));
    assert_eq!(rule.map(|hits| hits.len()), Some(1));
}

#[test]
fn comment_lines_are_not_code() {
    let file = SourceFile {
        path: PathBuf::from("src/coalescer.rs"),
        content: "/// Never call `.unwrap()` here.\nlet x = y?;\n    // std::thread::sleep is banned\n".into(),
    };
    assert_eq!(file.code_lines().map(|(number, _)| number).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn scans_engine_sources() {
    let files = production_sources();
    for expected in ["controller.rs", "coalescer.rs", "main.rs"] {
        assert!(
            files.iter().any(|file| file.path.ends_with(expected)),
            "{expected} not found under src/"
        );
    }
    assert!(files.iter().all(|file| !file.path.to_string_lossy().ends_with("_test.rs")));
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use callsift::calls::{CallKind, CallSite, Classification};
use callsift::{UnitClassification, Workspace};

/// Path of a fixture under tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// A workspace holding the given in-memory files
pub fn workspace(sources: &[(&str, &str)]) -> Workspace {
    let mut workspace = Workspace::with_module("example.com/shapes");
    for (name, source) in sources {
        workspace
            .add_source(*name, source)
            .unwrap_or_else(|e| panic!("Failed to add {}: {}", name, e));
    }
    workspace
}

/// A workspace holding every fixture under `dir`
pub fn fixture_workspace(dir: &str, module: &str) -> Workspace {
    let mut workspace = Workspace::with_module(module);
    let mut entries: Vec<PathBuf> = fs::read_dir(fixture_path(dir))
        .expect("Failed to read fixture directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("go"))
        .collect();
    entries.sort();
    for path in entries {
        workspace.add_file(&path).expect("Failed to add fixture");
    }
    workspace
}

/// The classification of the file named `name`
pub fn classification_of<'a>(units: &'a [UnitClassification], name: &str) -> &'a Classification {
    &units
        .iter()
        .find(|u| u.name.ends_with(name))
        .unwrap_or_else(|| panic!("Expected classified file: {}", name))
        .classification
}

/// Assert the call whose text is `text` has kind `kind`
pub fn assert_call_kind<'a>(
    workspace: &Workspace,
    classification: &'a Classification,
    text: &str,
    kind: CallKind,
) -> &'a CallSite {
    let site = classification
        .sites
        .iter()
        .find(|s| {
            workspace
                .unit(s.file)
                .is_some_and(|u| u.snippet(s.span) == text)
        })
        .unwrap_or_else(|| panic!("Expected call: {}", text));
    assert_eq!(site.kind, kind, "kind of `{}`", text);
    site
}

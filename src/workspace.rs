//! The analysis pipeline over a set of source files
//!
//! Files are parsed as they are added and grouped into packages by their
//! package clause. Each query re-runs the type checker over the current
//! trees, so results always describe the text that [`Workspace::render`]
//! would produce.

use std::fs;
use std::path::Path;

use callsift_ast::{FileId, FileSet, SyntaxUnit};
use callsift_calls::{classify_unit, Classification};
use callsift_graph::{build, GraphBuild};
use callsift_parser::parse;
use callsift_rewrite::{apply, RewriteOutcome, RewriteRule};
use callsift_types::{resolve_with_stdlib, PackageSource, TypeInfo};
use serde::Serialize;

use crate::error::{Error, Result};

/// Classification of one analyzed file
#[derive(Debug, Clone)]
pub struct UnitClassification {
    pub file: FileId,
    pub name: String,
    pub classification: Classification,
}

/// Everything a rewrite run changed in one file
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    pub name: String,
    pub outcome: RewriteOutcome,
}

/// Result of [`Workspace::rewrite`], one entry per file in load order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
    pub files: Vec<FileRewrite>,
}

impl RewriteReport {
    pub fn rewritten(&self) -> usize {
        self.files.iter().map(|f| f.outcome.rewritten).sum()
    }

    fn outcome_mut(&mut self, name: &str) -> &mut RewriteOutcome {
        let index = match self.files.iter().position(|f| f.name == name) {
            Some(index) => index,
            None => {
                self.files.push(FileRewrite {
                    name: name.to_string(),
                    outcome: RewriteOutcome::default(),
                });
                self.files.len() - 1
            }
        };
        &mut self.files[index].outcome
    }
}

/// A closed set of analyzed packages
#[derive(Debug, Default)]
pub struct Workspace {
    /// Import path prefix for packages other than `main`
    module: Option<String>,
    files: FileSet,
    packages: Vec<PackageSource>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packages get the import path `<prefix>/<package name>`
    pub fn with_module(prefix: impl Into<String>) -> Self {
        Self {
            module: Some(prefix.into().trim_end_matches('/').to_string()),
            ..Self::default()
        }
    }

    /// Parse `source` and add it to the package its package clause names
    pub fn add_source(&mut self, name: impl Into<String>, source: &str) -> Result<FileId> {
        let name = name.into();
        let file = self.files.add(name.clone());
        let unit = parse(source, &name, file).map_err(|source| Error::Syntax {
            name: name.clone(),
            file,
            source,
        })?;
        let path = self.import_path(unit.package_name());
        tracing::debug!(file = %name, package = %path, "added source");
        match self.packages.iter_mut().find(|p| p.path == path) {
            Some(package) => package.units.push(unit),
            None => self.packages.push(PackageSource::new(path, vec![unit])),
        }
        Ok(file)
    }

    /// Read and add a file from disk
    pub fn add_file(&mut self, path: &Path) -> Result<FileId> {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_source(path.display().to_string(), &source)
    }

    fn import_path(&self, package: &str) -> String {
        match &self.module {
            Some(prefix) if package != "main" => format!("{}/{}", prefix, package),
            _ => package.to_string(),
        }
    }

    pub fn packages(&self) -> &[PackageSource] {
        &self.packages
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Every analyzed unit in load order
    pub fn units(&self) -> impl Iterator<Item = &SyntaxUnit> {
        self.packages.iter().flat_map(|p| &p.units)
    }

    pub fn unit(&self, file: FileId) -> Option<&SyntaxUnit> {
        self.units().find(|u| u.file_id == file)
    }

    /// Run the type checker over the current trees
    pub fn check(&mut self) -> Result<TypeInfo> {
        if self.packages.is_empty() {
            return Err(Error::NoSources);
        }
        Ok(resolve_with_stdlib(&self.packages, &mut self.files)?)
    }

    /// Classify every call in every analyzed file
    #[tracing::instrument(skip_all)]
    pub fn classify(&mut self) -> Result<Vec<UnitClassification>> {
        let info = self.check()?;
        Ok(self
            .units()
            .map(|unit| UnitClassification {
                file: unit.file_id,
                name: unit.name.clone(),
                classification: classify_unit(unit, &info),
            })
            .collect())
    }

    /// Build the call graph over all analyzed files
    #[tracing::instrument(skip_all)]
    pub fn call_graph(&mut self) -> Result<GraphBuild> {
        let info = self.check()?;
        Ok(build(self.units(), &info))
    }

    /// Apply `rules` one after another. After a rule changes a file, the
    /// file is rendered and parsed again, and the next rule sees a freshly
    /// checked index.
    #[tracing::instrument(skip_all, fields(rules = rules.len()))]
    pub fn rewrite(&mut self, rules: &[&dyn RewriteRule]) -> Result<RewriteReport> {
        let mut report = RewriteReport::default();
        let mut info = self.check()?;
        for rule in rules {
            let mut changed = false;
            for package in &mut self.packages {
                for unit in &mut package.units {
                    let outcome = apply(*rule, unit, &info);
                    if !outcome.is_unchanged() {
                        changed = true;
                        reparse(unit)?;
                    }
                    report.outcome_mut(&unit.name).merge(outcome);
                }
            }
            tracing::debug!(rule = rule.name(), changed, "rule applied");
            if changed {
                info = self.check()?;
            }
        }
        Ok(report)
    }

    /// Current text of every analyzed file, in load order
    pub fn render(&self) -> Vec<(String, String)> {
        self.units().map(|u| (u.name.clone(), u.render())).collect()
    }
}

/// Replace `unit` with a fresh parse of its rendered text
fn reparse(unit: &mut SyntaxUnit) -> Result<()> {
    let text = unit.render();
    *unit = parse(&text, &unit.name, unit.file_id).map_err(|source| Error::Syntax {
        name: unit.name.clone(),
        file: unit.file_id,
        source,
    })?;
    Ok(())
}

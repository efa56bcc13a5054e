//! callsift types - type checker and Type Oracle for the Go subset
//!
//! [`resolve`] checks a closed set of packages and produces a [`TypeInfo`]:
//! which object every identifier denotes, how every selector was resolved,
//! and the type of every expression. Packages imported from outside the set
//! come from an [`Importer`].

mod checker;
mod error;
mod importer;
mod info;
pub mod lookup;
mod objects;
mod types;
mod universe;

pub use error::*;
pub use importer::*;
pub use info::*;
pub use objects::*;
pub use types::*;

use std::collections::{BTreeMap, HashMap};

use callsift_ast::FileSet;

use checker::Checker;

/// Where a package in the load order comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Analyzed(usize),
    External(usize),
}

/// Visit state for the import-order DFS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Completed,
}

struct Loader<'a> {
    analyzed: &'a [PackageSource],
    external: Vec<PackageSource>,
    importer: &'a mut dyn Importer,
    files: &'a mut FileSet,
    state: HashMap<String, VisitState>,
    path: Vec<String>,
    order: Vec<Source>,
}

impl Loader<'_> {
    fn find(&self, path: &str) -> Option<Source> {
        if let Some(i) = self.analyzed.iter().position(|p| p.path == path) {
            return Some(Source::Analyzed(i));
        }
        self.external
            .iter()
            .position(|p| p.path == path)
            .map(Source::External)
    }

    fn package(&self, source: Source) -> &PackageSource {
        match source {
            Source::Analyzed(i) => &self.analyzed[i],
            Source::External(i) => &self.external[i],
        }
    }

    /// Depth-first over imports; a package is ordered after everything it imports
    fn visit(&mut self, source: Source) -> Result<(), TypeCheckError> {
        let path = self.package(source).path.clone();
        match self.state.get(&path) {
            Some(VisitState::Completed) => return Ok(()),
            Some(VisitState::InProgress) => {
                let start = self.path.iter().position(|p| *p == path).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(path);
                return Err(TypeCheckError::ImportCycle { cycle });
            }
            None => {}
        }
        self.state.insert(path.clone(), VisitState::InProgress);
        self.path.push(path.clone());

        let imports: Vec<(String, callsift_ast::FileId, callsift_ast::Span)> = self
            .package(source)
            .units
            .iter()
            .flat_map(|u| {
                u.file
                    .imports
                    .iter()
                    .map(move |i| (i.path.clone(), u.file_id, i.span))
            })
            .collect();

        for (import, file, span) in imports {
            let dep = match self.find(&import) {
                Some(dep) => dep,
                None => match self.importer.import(&import, self.files)? {
                    Some(package) => {
                        self.external.push(package);
                        Source::External(self.external.len() - 1)
                    }
                    None => {
                        return Err(TypeCheckError::UnresolvedImport {
                            path: import,
                            importer: path,
                            file,
                            span,
                        })
                    }
                },
            };
            self.visit(dep)?;
        }

        self.path.pop();
        self.state.insert(path, VisitState::Completed);
        self.order.push(source);
        Ok(())
    }
}

/// Type-check `packages` and build the index over them.
///
/// Imports outside `packages` are requested from `importer`; new files it
/// parses are registered in `files`. Any type error fails the whole pass.
#[tracing::instrument(skip_all, fields(packages = packages.len()))]
pub fn resolve(
    packages: &[PackageSource],
    importer: &mut dyn Importer,
    files: &mut FileSet,
) -> Result<TypeInfo, TypeCheckError> {
    let mut loader = Loader {
        analyzed: packages,
        external: Vec::new(),
        importer,
        files,
        state: HashMap::new(),
        path: Vec::new(),
        order: Vec::new(),
    };
    for i in 0..packages.len() {
        loader.visit(Source::Analyzed(i))?;
    }
    let Loader {
        external, order, ..
    } = loader;

    let mut info = TypeInfo::new();
    let mut errors = Vec::new();
    for source in order {
        let (package, analyzed) = match source {
            Source::Analyzed(i) => (&packages[i], true),
            Source::External(i) => (&external[i], false),
        };
        let name = package.name().unwrap_or_default().to_string();
        let id = info.add_package(Package {
            path: package.path.clone(),
            name,
            scope: BTreeMap::new(),
            analyzed,
        });
        let found = Checker::new(&mut info, id, &package.units).check_package();
        tracing::debug!(
            path = %package.path,
            files = package.units.len(),
            errors = found.len(),
            "checked package"
        );
        errors.extend(found);
    }

    if errors.is_empty() {
        Ok(info)
    } else {
        Err(TypeCheckError::Check(errors))
    }
}

/// Resolve with the bundled standard library stubs as the only importer
pub fn resolve_with_stdlib(
    packages: &[PackageSource],
    files: &mut FileSet,
) -> Result<TypeInfo, TypeCheckError> {
    resolve(packages, &mut StdlibImporter, files)
}

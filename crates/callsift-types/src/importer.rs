//! Import resolution for packages outside the analyzed set

use callsift_ast::{FileSet, SyntaxUnit};
use callsift_parser::parse;

use crate::TypeCheckError;

/// All files of one package
#[derive(Debug, Clone)]
pub struct PackageSource {
    /// Import path
    pub path: String,
    pub units: Vec<SyntaxUnit>,
}

impl PackageSource {
    pub fn new(path: impl Into<String>, units: Vec<SyntaxUnit>) -> Self {
        Self {
            path: path.into(),
            units,
        }
    }

    /// Package name from the first file's package clause
    pub fn name(&self) -> Option<&str> {
        self.units.first().map(|u| u.package_name())
    }
}

/// Supplies packages imported by the analyzed set but not part of it.
///
/// Returning `Ok(None)` means the importer does not know the path.
pub trait Importer {
    fn import(
        &mut self,
        path: &str,
        files: &mut FileSet,
    ) -> Result<Option<PackageSource>, TypeCheckError>;
}

/// An importer that knows nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImporter;

impl Importer for NoImporter {
    fn import(&mut self, _: &str, _: &mut FileSet) -> Result<Option<PackageSource>, TypeCheckError> {
        Ok(None)
    }
}

const STDLIB: &[(&str, &str)] = &[
    ("errors", include_str!("stdlib/errors.go")),
    ("fmt", include_str!("stdlib/fmt.go")),
    ("os", include_str!("stdlib/os.go")),
    ("strconv", include_str!("stdlib/strconv.go")),
    ("strings", include_str!("stdlib/strings.go")),
];

/// Declaration-only stubs of a few standard library packages
#[derive(Debug, Default, Clone, Copy)]
pub struct StdlibImporter;

impl StdlibImporter {
    pub fn packages() -> impl Iterator<Item = &'static str> {
        STDLIB.iter().map(|(path, _)| *path)
    }
}

impl Importer for StdlibImporter {
    fn import(
        &mut self,
        path: &str,
        files: &mut FileSet,
    ) -> Result<Option<PackageSource>, TypeCheckError> {
        let Some((_, source)) = STDLIB.iter().find(|(p, _)| *p == path) else {
            return Ok(None);
        };
        let name = format!("<stdlib>/{}.go", path);
        let file_id = files.add(name.clone());
        let unit = parse(source, &name, file_id).map_err(|source| TypeCheckError::Import {
            path: path.to_string(),
            file: file_id,
            source,
        })?;
        tracing::trace!(path, "loaded stdlib stub");
        Ok(Some(PackageSource::new(path, vec![unit])))
    }
}

/// Try each importer in turn
pub struct ImporterChain<'a> {
    importers: Vec<&'a mut dyn Importer>,
}

impl<'a> ImporterChain<'a> {
    pub fn new(importers: Vec<&'a mut dyn Importer>) -> Self {
        Self { importers }
    }
}

impl Importer for ImporterChain<'_> {
    fn import(
        &mut self,
        path: &str,
        files: &mut FileSet,
    ) -> Result<Option<PackageSource>, TypeCheckError> {
        for importer in self.importers.iter_mut() {
            if let Some(package) = importer.import(path, files)? {
                return Ok(Some(package));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdlib_stubs_parse() {
        let mut files = FileSet::new();
        let mut importer = StdlibImporter;
        for path in StdlibImporter::packages() {
            let package = importer.import(path, &mut files).unwrap().unwrap();
            assert_eq!(package.name(), Some(path));
        }
        assert_eq!(files.len(), 5);
    }

    #[test]
    fn test_unknown_path() {
        let mut files = FileSet::new();
        assert!(StdlibImporter.import("net/http", &mut files).unwrap().is_none());
        assert!(files.is_empty());
    }

    #[test]
    fn test_chain_falls_through() {
        let mut files = FileSet::new();
        let mut none = NoImporter;
        let mut std = StdlibImporter;
        let mut chain = ImporterChain::new(vec![&mut none, &mut std]);
        assert!(chain.import("fmt", &mut files).unwrap().is_some());
    }
}

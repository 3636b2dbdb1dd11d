//! Schema and instance file loading utilities

use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};
use crate::instance::Instance;
use crate::schema::FormSchema;

/// Read a compiled survey document
pub fn load_schema(path: &Path) -> Result<FormSchema> {
    log::info!("Loading survey from {}", path.display());
    FormSchema::from_json_file(path)
}

/// Read one submission envelope
pub fn load_instance(path: &Path) -> Result<Instance> {
    let json = fs::read_to_string(path)?;
    Instance::from_json_str(&json).map_err(|e| match e {
        ExportError::InvalidInstance(msg) => {
            ExportError::InvalidInstance(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Find all `*.json` files in a directory, sorted by path
pub fn find_instance_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every submission in a directory in parallel, in file name order
pub fn load_instances_parallel(dir: &Path) -> Result<Vec<Instance>> {
    let files = find_instance_files(dir)?;
    if files.is_empty() {
        log::info!("No submissions found in directory: {}", dir.display());
        return Ok(Vec::new());
    }

    log::info!("Found {} submissions in {}", files.len(), dir.display());

    files
        .par_iter()
        .map(|path| load_instance(path))
        .collect::<Result<Vec<_>>>()
}

pub(crate) fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(ExportError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }
    Ok(())
}

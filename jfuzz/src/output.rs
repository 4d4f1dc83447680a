//! Writing generated programs to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::generator::Program;
use crate::GenResult;

/// Writes `program` under `out_dir` at its package path, e.g.
/// `out/javafuzz/T1.java`, and returns the written path.
///
/// The file is written to a temporary sibling and renamed into place, so
/// readers never observe a partially written unit.
pub fn write_program(out_dir: &Path, program: &Program) -> GenResult<PathBuf> {
    let path = out_dir.join(program.class_name.source_path());
    let dir = path.parent().unwrap_or(out_dir);
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(program.source.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(&path).map_err(|e| e.error)?;

    debug!("Wrote {} ({} bytes)", path.display(), program.source.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::generate_program;
    use tempfile::TempDir;

    #[test]
    fn test_writes_at_package_path() {
        let dir = TempDir::new().unwrap();
        let program = generate_program(&GenConfig::default(), 8).unwrap();

        let path = write_program(dir.path(), &program).unwrap();
        assert_eq!(path, dir.path().join("javafuzz").join("T1.java"));
        assert_eq!(fs::read_to_string(&path).unwrap(), program.source);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let first = generate_program(&GenConfig::default(), 1).unwrap();
        let second = generate_program(&GenConfig::default(), 2).unwrap();

        write_program(dir.path(), &first).unwrap();
        let path = write_program(dir.path(), &second).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), second.source);

        let leftovers = fs::read_dir(dir.path().join("javafuzz")).unwrap().count();
        assert_eq!(leftovers, 1, "temporary files must not remain");
    }
}

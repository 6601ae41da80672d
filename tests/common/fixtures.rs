// Test file fixtures

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Manages a temporary target file
pub struct TestFixture {
    temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestFixture {
    /// Create a new temporary file with given content
    pub fn new(filename: &str, content: &str) -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join(filename);

        let mut file = fs::File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(TestFixture { temp_dir, path })
    }

    /// A path in a fresh directory that does not exist yet
    pub fn missing(filename: &str) -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join(filename);
        Ok(TestFixture { temp_dir, path })
    }

    /// Directory holding the fixture, usable as a scratch dir
    pub fn dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Read the current content of the file
    pub fn read_content(&self) -> anyhow::Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Number of entries in the fixture directory
    pub fn entries(&self) -> anyhow::Result<usize> {
        Ok(fs::read_dir(self.temp_dir.path())?.count())
    }
}

//! Where the edited text comes from and where it goes

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination of the accepted buffer
#[derive(Debug)]
pub enum Destination {
    /// Overwrite this file
    File(PathBuf),
    /// Write to the original standard output
    Stdout,
}

impl Destination {
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::File(path.to_path_buf()),
            None => Self::Stdout,
        }
    }
}

/// Initial buffer contents.
///
/// With `start_empty` (`-e`) the file is not read at all. A missing file is an
/// empty buffer; any other read failure is fatal, including contents that are
/// not UTF-8.
pub fn load_initial(path: Option<&Path>, start_empty: bool) -> Result<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    if start_empty {
        return Ok(String::new());
    }

    match std::fs::read_to_string(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded target file");
            Ok(text)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Err(e).with_context(|| format!("{} is not valid UTF-8 text", path.display()))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Write the final buffer. Only called once the session has accepted.
pub fn write_result(destination: &Destination, text: &str) -> Result<()> {
    match destination {
        Destination::File(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "Wrote result");
        }
        Destination::Stdout => {
            write_to(&mut io::stdout().lock(), text).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn write_to(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

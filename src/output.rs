//! Output file helpers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write `path` through a temporary file in the same directory.
///
/// The target only appears once `write` has succeeded and the data is
/// flushed, so an interrupted export never leaves a truncated file behind.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".inkport-")
        .suffix(".part")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

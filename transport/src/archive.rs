use std::{
    fs,
    io::{Cursor, Write},
    path::Path,
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::{Result, TransportErr};

/// Packs the persisted artifact file at `path` into an in-memory zip
/// archive, ready for the upload endpoint. The entry is named after the
/// file on disk.
pub fn pack_artifact(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(&name, options)
        .map_err(|e| TransportErr::Zip(e.to_string()))?;
    zip.write_all(&bytes)?;
    zip.finish().map_err(|e| TransportErr::Zip(e.to_string()))?;

    Ok(buffer.into_inner())
}

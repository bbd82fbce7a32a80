//! Plain-text export of per-vertex scalar fields.
//!
//! One line per vertex: the vertex index and its value, separated by a space.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `values` to `path`, one `index value` pair per line.
pub fn save_values<P: AsRef<Path>>(values: &[f64], path: P) -> crate::error::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_values(values, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write `values` to any writer in the same layout as [`save_values`].
pub fn write_values<W: Write>(values: &[f64], writer: &mut W) -> std::io::Result<()> {
    for (i, v) in values.iter().enumerate() {
        writeln!(writer, "{} {:.9e}", i, v)?;
    }
    Ok(())
}

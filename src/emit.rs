use std::{
    io::Write as _,
    path::Path,
};

use anyhow::Context as _;

use crate::{
    core::{Canvas, FrameRgb},
    error::{TrailreelError, TrailreelResult},
};

/// `ftyp` box: isom major brand, minor version 0x200, compatible brands
/// isom, iso2, avc1 and mp41.
pub const FTYP_BOX: [u8; 32] = *b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00isomiso2avc1mp41";

/// Empty `moov` box, header only.
pub const MOOV_BOX: [u8; 8] = *b"\x00\x00\x00\x08moov";

/// Empty `mdat` box header; the raw pixels follow it unboxed.
pub const MDAT_BOX: [u8; 8] = *b"\x00\x00\x00\x08mdat";

/// Zero bytes appended after the pixel payload.
pub const TRAILER_PADDING_LEN: usize = 1024;

/// Exact artifact size for a canvas: boxes, one RGB frame, padding.
pub fn artifact_len(canvas: Canvas) -> usize {
    FTYP_BOX.len() + MOOV_BOX.len() + MDAT_BOX.len() + canvas.rgb_len() + TRAILER_PADDING_LEN
}

pub fn ensure_parent_dir(path: &Path) -> TrailreelResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir '{}'", parent.display()))?;
        }
    }
    Ok(())
}

/// Write the placeholder container to `path`.
///
/// The layout is fixed: the three box headers, then the raw RGB24 pixels of
/// the first frame only, then the zero trailer. Frames past the first
/// contribute nothing to the file.
pub fn emit_artifact(path: &Path, frames: &[FrameRgb]) -> TrailreelResult<()> {
    let first = frames
        .first()
        .ok_or_else(|| TrailreelError::validation("no frames to emit"))?;
    first.validate()?;

    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);

    out.write_all(&FTYP_BOX)?;
    out.write_all(&MOOV_BOX)?;
    out.write_all(&MDAT_BOX)?;
    out.write_all(&first.data)?;
    out.write_all(&[0u8; TRAILER_PADDING_LEN])?;
    out.flush()?;
    Ok(())
}

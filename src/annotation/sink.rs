use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    annotation::record::AnnotationRecord,
    encode::ffmpeg::ensure_parent_dir,
    foundation::error::{SynthError, SynthResult},
};

/// `{sequence}_c{clip_no:04}_info.json` inside `output_dir`. Spaces are dropped from the name.
pub fn annotation_path(output_dir: &Path, sequence: &str, clip_no: usize) -> PathBuf {
    let name: String = sequence.chars().filter(|c| *c != ' ').collect();
    output_dir.join(format!("{name}_c{clip_no:04}_info.json"))
}

pub fn write_json(path: &Path, record: &AnnotationRecord) -> SynthResult<()> {
    ensure_parent_dir(path)?;
    let f = std::fs::File::create(path)
        .with_context(|| format!("create annotation file '{}'", path.display()))?;
    let mut w = std::io::BufWriter::new(f);
    serde_json::to_writer(&mut w, record)
        .map_err(|e| SynthError::serde(format!("serialize annotations: {e}")))?;
    use std::io::Write as _;
    w.flush()
        .with_context(|| format!("flush annotation file '{}'", path.display()))?;
    tracing::info!(path = %path.display(), frames = record.frames(), "annotations written");
    Ok(())
}

pub fn read_json(path: &Path) -> SynthResult<AnnotationRecord> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open annotation file '{}'", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(f))
        .map_err(|e| SynthError::serde(format!("parse annotations: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/sink.rs"]
mod tests;

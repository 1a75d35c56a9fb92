use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::compile::builder::ImageSet;
use crate::foundation::error::RespimgResult;

/// Counters returned by [`write_image_set`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Files created or replaced.
    pub written: usize,
    /// Files left alone because their bytes already matched.
    pub unchanged: usize,
    /// Outputs of earlier builds of the same image that the new manifest no longer lists.
    pub removed: usize,
}

/// Path of the manifest written for an image named `name`.
pub fn manifest_path(out_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    out_dir.as_ref().join(format!("{name}.manifest.json"))
}

/// Write every file of `set` plus `<name>.manifest.json` into `out_dir`.
///
/// Files whose current contents already match are not rewritten, so an unchanged rebuild leaves
/// modification times alone. Variant and placeholder files named after the same image but absent
/// from the new set (for example older hashed names) are deleted; other files are left alone.
#[tracing::instrument(skip(set), fields(out_dir = %out_dir.as_ref().display()))]
pub fn write_image_set(set: &ImageSet, out_dir: impl AsRef<Path>) -> RespimgResult<WriteStats> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    let mut stats = WriteStats::default();
    for v in set.files() {
        write_if_changed(&out_dir.join(&v.file_name), &v.encoded, &mut stats)?;
    }

    let json = set.manifest.to_json_pretty()?;
    write_if_changed(
        &manifest_path(out_dir, &set.manifest.name),
        json.as_bytes(),
        &mut stats,
    )?;

    let keep = set
        .files()
        .map(|v| v.file_name.as_str())
        .collect::<HashSet<_>>();
    stats.removed = remove_stale(out_dir, &set.manifest.name, &keep)?;

    tracing::info!(
        written = stats.written,
        unchanged = stats.unchanged,
        removed = stats.removed,
        "wrote image set"
    );
    Ok(stats)
}

fn write_if_changed(path: &Path, bytes: &[u8], stats: &mut WriteStats) -> RespimgResult<()> {
    if let Ok(existing) = std::fs::read(path)
        && existing == bytes
    {
        stats.unchanged += 1;
        return Ok(());
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    stats.written += 1;
    Ok(())
}

fn remove_stale(out_dir: &Path, name: &str, keep: &HashSet<&str>) -> RespimgResult<usize> {
    let entries = std::fs::read_dir(out_dir)
        .with_context(|| format!("list output dir '{}'", out_dir.display()))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("list output dir '{}'", out_dir.display()))?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if keep.contains(file_name) || !is_output_of(file_name, name) {
            continue;
        }
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        std::fs::remove_file(&path).with_context(|| format!("remove '{}'", path.display()))?;
        tracing::debug!(file = file_name, "removed stale output");
        removed += 1;
    }
    Ok(removed)
}

/// Whether `file_name` has the shape of a variant or placeholder generated for `name`:
/// `{name}[-placeholder]-{width}[-{8 hex}].{webp|jpg|png}`.
fn is_output_of(file_name: &str, name: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(name)
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };
    let rest = rest.strip_prefix("placeholder-").unwrap_or(rest);
    let Some((stem, ext)) = rest.rsplit_once('.') else {
        return false;
    };
    if !matches!(ext, "webp" | "jpg" | "png") {
        return false;
    }
    let (width, hash) = match stem.split_once('-') {
        Some((w, h)) => (w, Some(h)),
        None => (stem, None),
    };
    let is_width = !width.is_empty() && width.bytes().all(|b| b.is_ascii_digit());
    let is_hash = hash.is_none_or(|h| {
        h.len() == 8 && h.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    });
    is_width && is_hash
}

#[cfg(test)]
#[path = "../../tests/unit/output/writer.rs"]
mod tests;

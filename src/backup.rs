use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "rosterd-workspace-v1";
/// Workspace files carried by a bundle, stored under `data/`.
pub const DATA_FILES: [&str; 2] = ["students.csv", "courses.csv"];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub exported_at: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub files_restored: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn data_entry(name: &str) -> String {
    format!("data/{name}")
}

/// Packs the on-disk CSVs of `workspace_path` (not any unsaved state) into a
/// zip at `out_path`.
pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let mut payloads: Vec<(String, Vec<u8>)> = Vec::new();
    for name in DATA_FILES {
        let src = workspace_path.join(name);
        if !src.is_file() {
            return Err(anyhow!("workspace file not found: {}", src.to_string_lossy()));
        }
        let bytes =
            std::fs::read(&src).with_context(|| format!("failed to read {}", src.to_string_lossy()))?;
        payloads.push((data_entry(name), bytes));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = chrono::Utc::now().to_rfc3339();
    let entries: Vec<serde_json::Value> = payloads
        .iter()
        .map(|(path, bytes)| {
            json!({
                "path": path,
                "sha256": sha256_hex(bytes),
                "size": bytes.len(),
            })
        })
        .collect();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "entries": entries,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (path, bytes) in &payloads {
        zip.start_file(path.as_str(), opts)
            .with_context(|| format!("failed to start entry {path}"))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {path}"))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;
    tracing::info!(out = %out_path.display(), "workspace bundle exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: payloads.len() + 1,
        exported_at,
    })
}

fn write_temp(tmp: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut out = File::create(tmp)
        .with_context(|| format!("failed to create temp file {}", tmp.to_string_lossy()))?;
    out.write_all(bytes)
        .with_context(|| format!("failed to write temp file {}", tmp.to_string_lossy()))?;
    out.flush()
        .with_context(|| format!("failed to flush temp file {}", tmp.to_string_lossy()))?;
    Ok(())
}

fn discard_temps(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}

/// Restores the CSVs of a bundle into `workspace_path`. Every entry is
/// checked against the manifest digest before any workspace file is touched.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let entries = manifest
        .get("entries")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut verified: Vec<(&str, Vec<u8>)> = Vec::new();
    for name in DATA_FILES {
        let path = data_entry(name);
        let expected = entries
            .iter()
            .find(|e| e.get("path").and_then(|v| v.as_str()) == Some(path.as_str()))
            .and_then(|e| e.get("sha256").and_then(|v| v.as_str()))
            .ok_or_else(|| anyhow!("manifest has no digest for {path}"))?
            .to_string();

        let mut bytes = Vec::new();
        archive
            .by_name(&path)
            .with_context(|| format!("bundle missing {path}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {path}"))?;
        let actual = sha256_hex(&bytes);
        if actual != expected {
            return Err(anyhow!(
                "checksum mismatch for {path}: expected {expected}, got {actual}"
            ));
        }
        verified.push((name, bytes));
    }

    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (name, bytes) in &verified {
        let tmp = workspace_path.join(format!("{name}.importing"));
        // Clear a leftover from an interrupted import.
        let _ = std::fs::remove_file(&tmp);
        if let Err(e) = write_temp(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            discard_temps(&staged);
            return Err(e);
        }
        staged.push((tmp, workspace_path.join(name)));
    }
    // The renames are not atomic as a set: if a later one fails, files moved
    // before it are already restored while the rest keep their old contents.
    for (i, (tmp, dst)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, dst) {
            discard_temps(&staged[i..]);
            return Err(e).with_context(|| {
                format!(
                    "failed to move extracted file to {}",
                    dst.to_string_lossy()
                )
            });
        }
    }
    tracing::info!(workspace = %workspace_path.display(), "workspace bundle imported");

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        files_restored: staged.len(),
    })
}

//! IDML 包的解压与打包
//!
//! IDML 就是一个 zip 容器。打包时 `mimetype` 必须是第一个条目且不压缩，
//! 否则 InDesign 会拒绝打开。

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::utils::{IdmlError, Result};

/// 包内 mimetype 条目名
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// 解压统计
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveStats {
    pub files: usize,
    pub skipped: usize,
}

/// 将 `.idml` 包完整解压到目标目录
///
/// 条目名中带 `..` 或绝对路径的会被跳过并记录警告。
pub fn extract_package(idml_path: &Path, dest: &Path) -> Result<ArchiveStats> {
    let file = File::open(idml_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut stats = ArchiveStats::default();

    std::fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = sanitize_entry_name(entry.name()) else {
            log::warn!("跳过不安全的包条目: {}", entry.name());
            stats.skipped += 1;
            continue;
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        std::fs::write(&out_path, &bytes)?;
        stats.files += 1;
    }

    log::debug!("解压 {:?} -> {:?}: {} 个文件", idml_path, dest, stats.files);
    Ok(stats)
}

/// 将目录打包为 `.idml`
///
/// `mimetype` 以存储方式最先写入，其余文件按相对路径排序后压缩写入。
pub fn write_package(src_dir: &Path, out_path: &Path) -> Result<usize> {
    if !src_dir.is_dir() {
        return Err(IdmlError::InvalidPackage(format!(
            "package directory does not exist: {}",
            src_dir.display()
        )));
    }
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(out_path)?);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut written = 0;

    let mimetype = src_dir.join(MIMETYPE_ENTRY);
    if mimetype.is_file() {
        zip.start_file(MIMETYPE_ENTRY, stored)?;
        zip.write_all(&std::fs::read(&mimetype)?)?;
        written += 1;
    } else {
        log::warn!("{:?} 缺少 mimetype 条目", src_dir);
    }

    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(src_dir).follow_links(false) {
        let entry = entry.map_err(|e| IdmlError::InvalidPackage(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry_name(src_dir, entry.path()) else {
            continue;
        };
        if name == MIMETYPE_ENTRY {
            continue;
        }
        entries.push((name, entry.into_path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, path) in entries {
        zip.start_file(name, deflated)?;
        zip.write_all(&std::fs::read(&path)?)?;
        written += 1;
    }

    zip.finish()?;
    log::debug!("打包 {:?} -> {:?}: {} 个文件", src_dir, out_path, written);
    Ok(written)
}

/// 条目名转为安全的相对路径
fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// 文件相对打包根目录的条目名，统一使用 `/` 分隔
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

//! 语言代码工具
//!
//! 字典目录下的子目录名就是语言代码；回注时只接受 ISO 639-1 两字母代码。

use std::path::{Path, PathBuf};

use isolang::Language;

use crate::utils::Result;

/// 是否为有效的 ISO 639-1 两字母代码
pub fn is_iso_639_1(code: &str) -> bool {
    code.len() == 2
        && code.chars().all(|c| c.is_ascii_lowercase())
        && Language::from_639_1(code).is_some()
}

/// 从 IDML 文件名推断源语言：`en.idml` -> `en`
pub fn source_language_from_file_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let language = file_name.split('.').next()?;
    if language.is_empty() {
        None
    } else {
        Some(language.to_string())
    }
}

/// 列出包字典目录下的目标语言
///
/// 排除源语言，忽略非目录项和无效的语言代码，按代码排序。
pub fn target_languages(dictionary_dir: &Path, source_language: &str) -> Result<Vec<String>> {
    let mut languages = Vec::new();
    for entry in std::fs::read_dir(dictionary_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == source_language {
            continue;
        }
        if !is_iso_639_1(&name) {
            log::warn!("忽略无效的语言目录: {:?}", entry.path());
            continue;
        }
        languages.push(name);
    }
    languages.sort();
    Ok(languages)
}

/// 字典文件路径：`<dictionary_dir>/<package>/<language>/translation.json`
pub fn dictionary_path(dictionary_dir: &Path, package: &str, language: &str) -> PathBuf {
    dictionary_dir
        .join(package)
        .join(language)
        .join(crate::dictionary::DICTIONARY_FILE)
}

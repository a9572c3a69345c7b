use thiserror::Error;
use std::path::{Path, PathBuf};

/// 行分隔符（U+2028），仅从字典键中移除
pub const LINE_SEPARATOR: char = '\u{2028}';
/// 段落分隔符（U+2029），键和显示文本中都会移除
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum IdmlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("In package {package}: missing {page} (spread {spread}) in translation file for language {language}")]
    MissingPage {
        package: String,
        spread: String,
        page: String,
        language: String,
    },

    #[error("In package {package}: missing translation file {path:?} for language {language}")]
    MissingDictionary {
        package: String,
        language: String,
        path: PathBuf,
    },

    #[error("No IDML file found in {0:?}")]
    PackageNotFound(PathBuf),

    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// 库内统一的结果类型
pub type Result<T> = std::result::Result<T, IdmlError>;

/// 键过滤：移除两种不可见分隔符，用于字典键
pub fn clean_key(text: &str) -> String {
    text.chars()
        .filter(|&c| c != LINE_SEPARATOR && c != PARAGRAPH_SEPARATOR)
        .collect()
}

/// 显示过滤：只移除段落分隔符，用于译文/显示文本
pub fn clean_display(text: &str) -> String {
    text.chars().filter(|&c| c != PARAGRAPH_SEPARATOR).collect()
}

/// 将文档原始字节解码为文本
///
/// IDML 中的 XML 均为 UTF-8；带 BOM 的文件会被正确识别，
/// 非法字节序列会被替换并记录警告，而不是中断处理。
pub fn decode_document_bytes(bytes: &[u8], path: &Path) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        log::warn!("文件包含非法UTF-8字节，已替换: {:?}", path);
    }
    text.into_owned()
}

/// 读取文档文件并解码为文本
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_document_bytes(&bytes, path))
}

/// 创建文件备份
///
/// 备份文件名格式：`<stem>.<YYYY-mm-dd-HH-MM-SS>.bak`
pub fn create_backup(file_path: &Path) -> Result<PathBuf> {
    if !file_path.exists() {
        return Err(IdmlError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在"
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path)?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_key_strips_both_separators() {
        assert_eq!(clean_key("Hello\u{2028}World\u{2029}"), "HelloWorld");
        assert_eq!(clean_key("plain"), "plain");
    }

    #[test]
    fn test_clean_display_keeps_line_separator() {
        assert_eq!(clean_display("Hello\u{2028}World\u{2029}"), "Hello\u{2028}World");
        // 两种过滤结果可能不同
        assert_ne!(clean_key("a\u{2028}b"), clean_display("a\u{2028}b"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBF<Story/>";
        assert_eq!(decode_document_bytes(bytes, Path::new("x.xml")), "<Story/>");
    }

    #[test]
    fn test_decode_replaces_invalid_bytes() {
        let bytes = b"ab\xFFcd";
        assert_eq!(decode_document_bytes(bytes, Path::new("x.xml")), "ab\u{FFFD}cd");
    }

    #[test]
    fn test_create_backup() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let file = temp_dir.path().join("translation.json");
        std::fs::write(&file, "{}").unwrap();

        let backup = create_backup(&file).unwrap();
        assert!(backup.exists());
        assert!(backup.to_string_lossy().ends_with(".bak"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{}");

        assert!(create_backup(&temp_dir.path().join("missing.json")).is_err());
    }
}

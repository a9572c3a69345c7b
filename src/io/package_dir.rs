/// 解包目录 IO 实现
///
/// 提供基于文件系统的默认实现：包内容已解压到一个目录中
use std::path::{Path, PathBuf};

use super::traits::{PackageReader, PackageWriter};
use crate::spread::SPREADS_DIR;
use crate::utils::{read_document, Result};

/// 已解压到目录的 IDML 包
#[derive(Debug, Clone)]
pub struct DirectoryPackage {
    root: PathBuf,
    name: String,
}

impl DirectoryPackage {
    /// 创建目录包
    ///
    /// # 参数
    /// * `root` - 解压目录（包含 `designmap.xml`）
    /// * `name` - 包名称
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageReader for DirectoryPackage {
    fn read_text(&self, relative: &Path) -> Result<String> {
        read_document(&self.root.join(relative))
    }

    fn exists(&self, relative: &Path) -> bool {
        self.root.join(relative).is_file()
    }

    fn list_spread_files(&self) -> Result<Vec<String>> {
        let spreads_dir = self.root.join(SPREADS_DIR);
        if !spreads_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&spreads_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".xml") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl PackageWriter for DirectoryPackage {
    fn write_text(&self, relative: &Path, text: &str) -> Result<()> {
        let path = self.root.join(relative);
        // 确保父目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_and_write_text() {
        let temp_dir = TempDir::new().unwrap();
        let package = DirectoryPackage::new(temp_dir.path(), "brochure");

        let relative = Path::new("Stories/Story_u1.xml");
        assert!(!package.exists(relative));

        package.write_text(relative, "<idPkg:Story/>").unwrap();
        assert!(package.exists(relative));
        assert_eq!(package.read_text(relative).unwrap(), "<idPkg:Story/>");
        assert_eq!(package.name(), "brochure");
    }

    #[test]
    fn test_list_spread_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let package = DirectoryPackage::new(temp_dir.path(), "brochure");
        assert!(package.list_spread_files().unwrap().is_empty());

        let spreads = temp_dir.path().join("Spreads");
        std::fs::create_dir_all(&spreads).unwrap();
        std::fs::write(spreads.join("Spread_ub.xml"), "").unwrap();
        std::fs::write(spreads.join("Spread_ua.xml"), "").unwrap();
        std::fs::write(spreads.join("notes.txt"), "").unwrap();

        assert_eq!(
            package.list_spread_files().unwrap(),
            vec!["Spread_ua.xml", "Spread_ub.xml"]
        );
    }
}

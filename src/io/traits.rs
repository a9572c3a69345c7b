/// IO 抽象层 - trait 定义
///
/// 核心逻辑只需要三种能力：读取包内文档文本、写回文档文本、列出跨页文件。
/// 解包/打包与目录脚手架都在这些接口之外。

use std::path::Path;
use crate::utils::Result;

/// 包内文档读取 trait
///
/// # 职责
/// - 按包内相对路径读取文档文本（如 `Stories/Story_u19f.xml`）
/// - 不负责解析，仅负责 IO
pub trait PackageReader {
    /// 读取文档文本
    ///
    /// # 参数
    /// * `relative` - 包内相对路径
    fn read_text(&self, relative: &Path) -> Result<String>;

    /// 文档是否存在
    fn exists(&self, relative: &Path) -> bool;

    /// 列出 `Spreads/` 下的跨页文件名（按文件名排序）
    ///
    /// 目录不存在时返回空列表。
    fn list_spread_files(&self) -> Result<Vec<String>>;

    /// 包名称（用于日志与诊断）
    fn name(&self) -> &str;
}

/// 包内文档写入 trait
///
/// # 职责
/// - 将修改后的文档文本整体写回，完全替换原有内容
pub trait PackageWriter {
    /// 写入文档文本
    ///
    /// # 参数
    /// * `relative` - 包内相对路径
    /// * `text` - 新的完整文档文本
    fn write_text(&self, relative: &Path, text: &str) -> Result<()>;
}

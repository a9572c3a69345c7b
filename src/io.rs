/// IO 抽象层模块
///
/// 该模块提供包内文档读写的抽象接口，核心逻辑只通过这些接口访问文件。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **package_dir**: 已解压目录的默认实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use idml_translator::io::{DirectoryPackage, PackageReader};
///
/// let package = DirectoryPackage::new("temp/brochure/brochure", "brochure");
/// let spreads = package.list_spread_files()?;
/// ```
pub mod traits;
pub mod package_dir;

// === 导出 trait 定义 ===
pub use traits::{PackageReader, PackageWriter};

// === 导出默认实现 ===
pub use package_dir::DirectoryPackage;

//! 跨页顺序解析
//!
//! 设计清单 `designmap.xml` 按作者编排顺序列出跨页文件，
//! 页面编号 `page-<N>` 由跨页在该序列中的位置决定。

use std::path::Path;

use crate::io::PackageReader;
use crate::markup;
use crate::schema::{DESIGNMAP_ROOT, DESIGNMAP_SPREADS};
use crate::utils::Result;

/// 设计清单文件名
pub const DESIGNMAP_FILE: &str = "designmap.xml";

/// 跨页文件名前缀
pub const SPREAD_FILE_PREFIX: &str = "Spread_";
/// 跨页文件目录
pub const SPREADS_DIR: &str = "Spreads";

const TEXT_FRAME_MARKER: &str = "<TextFrame Self=\"";
const PARENT_STORY_MARKER: &str = "ParentStory=\"";

/// 跨页顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadOrder {
    spread_ids: Vec<String>,
}

impl SpreadOrder {
    /// 从设计清单文本解析跨页顺序
    ///
    /// 节点缺失时返回空序列，不会报错。
    pub fn from_designmap(designmap: &str) -> Self {
        let parsed = markup::parse(designmap);
        if let Some(diagnostic) = &parsed.diagnostic {
            log::warn!("设计清单解析不完整: {}", diagnostic);
        }

        let spread_ids = match parsed.root() {
            Some(root) if root.name == DESIGNMAP_ROOT => DESIGNMAP_SPREADS
                .select(root)
                .into_iter()
                .filter_map(|spread| spread.attribute("src"))
                .map(spread_id_from_src)
                .collect(),
            _ => Vec::new(),
        };

        Self { spread_ids }
    }

    /// 解析包的跨页顺序
    ///
    /// 优先使用设计清单；清单不存在时退回到跨页文件列表。
    pub fn resolve<P: PackageReader + ?Sized>(package: &P) -> Result<Self> {
        let designmap = Path::new(DESIGNMAP_FILE);
        if package.exists(designmap) {
            return Ok(Self::from_designmap(&package.read_text(designmap)?));
        }

        log::warn!("包 {} 缺少 {}，按跨页文件名排序", package.name(), DESIGNMAP_FILE);
        Ok(Self::from_spread_files(&package.list_spread_files()?))
    }

    /// 没有设计清单时，按文件名排序后的跨页文件列表推断顺序
    pub fn from_spread_files<S: AsRef<str>>(file_names: &[S]) -> Self {
        let mut names: Vec<&str> = file_names.iter().map(|s| s.as_ref()).collect();
        names.sort_unstable();
        Self {
            spread_ids: names.into_iter().map(spread_id_from_file_name).collect(),
        }
    }

    /// 跨页在序列中的位置（从 0 开始）
    pub fn position(&self, spread_id: &str) -> Option<usize> {
        self.spread_ids.iter().position(|id| id == spread_id)
    }

    /// 跨页对应的页面 ID
    ///
    /// 未知跨页得到 `page-0`。
    pub fn page_id(&self, spread_id: &str) -> String {
        match self.position(spread_id) {
            Some(index) => format!("page-{}", index + 1),
            None => {
                log::warn!("跨页 {} 不在设计清单中，页面ID为 page-0", spread_id);
                "page-0".to_string()
            }
        }
    }

    pub fn spread_ids(&self) -> &[String] {
        &self.spread_ids
    }

    pub fn len(&self) -> usize {
        self.spread_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spread_ids.is_empty()
    }
}

/// `Spreads/Spread_u12.xml` -> `u12`
fn spread_id_from_src(src: &str) -> String {
    let file_name = src.rsplit('/').next().unwrap_or(src);
    spread_id_from_file_name(file_name)
}

/// `Spread_u12.xml` -> `u12`
pub fn spread_id_from_file_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".xml").unwrap_or(file_name);
    stem.strip_prefix(SPREAD_FILE_PREFIX).unwrap_or(stem).to_string()
}

/// 扫描跨页文本，得到其引用的故事 ID 列表
///
/// 跨页文件可能很大而这里只需要一个属性，所以逐行做文本扫描而不是完整解析。
/// 重复的故事 ID 按出现顺序保留。
pub fn story_ids_for_spread(spread_text: &str) -> Vec<String> {
    let mut story_ids = Vec::new();

    for line in spread_text.lines() {
        let Some(frame_start) = line.find(TEXT_FRAME_MARKER) else {
            continue;
        };
        let frame = &line[frame_start..];
        let Some(attr_start) = frame.find(PARENT_STORY_MARKER) else {
            log::debug!("文本框缺少 ParentStory 属性: {}", frame);
            continue;
        };

        let value = &frame[attr_start + PARENT_STORY_MARKER.len()..];
        let story_id: String = value.chars().take_while(|&c| c != '"').collect();
        if !story_id.is_empty() {
            story_ids.push(story_id);
        }
    }

    story_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIGNMAP: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<?aid style="50" type="document" readerVersion="6.0" featureSet="257" product="15.0(300)" ?>
<Document xmlns:idPkg="http://ns.adobe.com/AdobeInDesign/idml/1.0/packaging" DOMVersion="15.0" Self="d">
	<idPkg:Graphic src="Resources/Graphic.xml" />
	<idPkg:Spread src="Spreads/Spread_ub6.xml" />
	<idPkg:Spread src="Spreads/Spread_ua1.xml" />
	<idPkg:Spread src="Spreads/Spread_uc3.xml" />
	<idPkg:Story src="Stories/Story_u10f.xml" />
</Document>"#;

    #[test]
    fn test_designmap_order() {
        let order = SpreadOrder::from_designmap(DESIGNMAP);
        assert_eq!(order.spread_ids(), &["ub6", "ua1", "uc3"]);
        assert_eq!(order.page_id("ub6"), "page-1");
        assert_eq!(order.page_id("uc3"), "page-3");
    }

    #[test]
    fn test_single_spread_is_normalized() {
        let order = SpreadOrder::from_designmap(
            r#"<Document><idPkg:Spread src="Spreads/Spread_u1.xml"/></Document>"#,
        );
        assert_eq!(order.len(), 1);
        assert_eq!(order.page_id("u1"), "page-1");
    }

    #[test]
    fn test_unknown_spread_is_page_zero() {
        let order = SpreadOrder::from_designmap(DESIGNMAP);
        assert_eq!(order.position("zzz"), None);
        assert_eq!(order.page_id("zzz"), "page-0");
    }

    #[test]
    fn test_missing_spreads_yield_empty_order() {
        assert!(SpreadOrder::from_designmap("<Document/>").is_empty());
        assert!(SpreadOrder::from_designmap("").is_empty());
        assert!(SpreadOrder::from_designmap("<Other><idPkg:Spread src=\"x\"/></Other>").is_empty());
    }

    #[test]
    fn test_order_from_spread_files() {
        let order = SpreadOrder::from_spread_files(&["Spread_ub.xml", "Spread_ua.xml"]);
        assert_eq!(order.spread_ids(), &["ua", "ub"]);
    }

    #[test]
    fn test_resolve_prefers_designmap() {
        use crate::io::{DirectoryPackage, PackageWriter};

        let temp_dir = tempfile::TempDir::new().unwrap();
        let package = DirectoryPackage::new(temp_dir.path(), "brochure");
        package.write_text(Path::new("Spreads/Spread_ua1.xml"), "").unwrap();
        package.write_text(Path::new("Spreads/Spread_ub6.xml"), "").unwrap();

        let order = SpreadOrder::resolve(&package).unwrap();
        assert_eq!(order.spread_ids(), &["ua1", "ub6"]);

        package.write_text(Path::new(DESIGNMAP_FILE), DESIGNMAP).unwrap();
        let order = SpreadOrder::resolve(&package).unwrap();
        assert_eq!(order.spread_ids(), &["ub6", "ua1", "uc3"]);
    }

    #[test]
    fn test_spread_id_from_file_name() {
        assert_eq!(spread_id_from_file_name("Spread_u12.xml"), "u12");
        assert_eq!(spread_id_from_file_name("u12.xml"), "u12");
    }

    #[test]
    fn test_story_ids_for_spread() {
        let spread = r#"<Spread Self="ub6">
	<TextFrame Self="u1b4" ParentStory="u19f" PreviousTextFrame="n" NextTextFrame="n">
	</TextFrame>
	<Rectangle Self="u200" />
	<TextFrame Self="u1c0" ParentStory="u1a9" ContentType="TextType">
	<TextFrame Self="u1c1" ContentType="TextType">
	<TextFrame Self="u1c2" ParentStory="u1a9">
</Spread>"#;
        assert_eq!(story_ids_for_spread(spread), vec!["u19f", "u1a9", "u1a9"]);
    }
}

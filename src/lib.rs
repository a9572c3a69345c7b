pub mod utils;
pub mod markup;
pub mod schema;
pub mod spread;
pub mod story;
pub mod string_types;
pub mod hyperlink;
pub mod io;
pub mod dictionary;
pub mod reinject;
pub mod language;
pub mod archive;
pub mod config;
pub mod pipeline;

// 重新导出主要结构
pub use config::TranslatorConfig;
pub use dictionary::{build_dictionary, DictionaryStats, TranslationDictionary};
pub use io::{DirectoryPackage, PackageReader, PackageWriter};
pub use pipeline::{
    ExtractionRun, Extractor, PackageSource, SkipReason, SkippedPackage, TranslationRun, Translator,
};
pub use reinject::{ReinjectionReport, StoryReinjector, StoryReport};
pub use spread::SpreadOrder;
pub use story::{extract_runs, Run, StoryExtraction};
pub use string_types::TranslationUnit;
pub use utils::{IdmlError, Result};

// 常量定义
pub const IDML_EXTENSION: &str = "idml";

//! 运行配置
//!
//! 四个工作目录，可由 JSON 配置文件给出，缺省字段使用默认值。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::{IdmlError, Result};

fn default_input_dir() -> PathBuf {
    PathBuf::from("./input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_dictionary_dir() -> PathBuf {
    PathBuf::from("./translate_json")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

/// 翻译工具配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// 输入目录：每个包一个子目录，内含 `.idml`
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// 输出目录：`<output>/<包>/<语言>.idml`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 字典目录：`<dict>/<包>/<语言>/translation.json`
    #[serde(default = "default_dictionary_dir")]
    pub dictionary_dir: PathBuf,

    /// 临时解压目录
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            dictionary_dir: default_dictionary_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl TranslatorConfig {
    /// 从 JSON 配置文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IdmlError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            IdmlError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// 检查目录设置
    ///
    /// 临时目录在每次运行时会被清空，不能与其他目录重合。
    pub fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("input_dir", &self.input_dir),
            ("output_dir", &self.output_dir),
            ("dictionary_dir", &self.dictionary_dir),
        ] {
            if dir == &self.temp_dir {
                return Err(IdmlError::ConfigError(format!(
                    "temp_dir must differ from {}: {}",
                    name,
                    dir.display()
                )));
            }
        }
        if self.input_dir == self.output_dir {
            return Err(IdmlError::ConfigError(format!(
                "output_dir must differ from input_dir: {}",
                self.input_dir.display()
            )));
        }
        Ok(())
    }
}

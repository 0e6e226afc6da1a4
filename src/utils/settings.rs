//! 编辑器设置：最近打开的项目、导出目录、新项目默认区域

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::model::tree::DEFAULT_REGION;
use crate::utils::fs::{read_json_file, write_json_file};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub last_project: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub default_regions: Vec<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            last_project: None,
            export_dir: None,
            default_regions: vec![DEFAULT_REGION.to_string()],
        }
    }
}

impl EditorSettings {
    /// 读取设置；文件不存在时返回默认值
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!("设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }
        let mut settings: Self = read_json_file(path)?;
        if settings.default_regions.is_empty() {
            settings.default_regions.push(DEFAULT_REGION.to_string());
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        write_json_file(path, self)?;
        tracing::debug!("设置已保存: {}", path.display());
        Ok(())
    }

    /// 记录最近打开的项目
    pub fn remember_project(&mut self, path: &Path) {
        self.last_project = Some(path.to_path_buf());
    }
}

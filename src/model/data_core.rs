//! AppState：当前项目会话状态与文件读写

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::model::edit::{EditError, Editor, TreeFilter};
use crate::model::tree::{Info, Project};
use crate::utils::fs::{read_text_file, write_text_file};
use crate::xml::export::encode_export;
use crate::xml::project::{decode_project, encode_project};
use crate::xml::DecodeError;

/// 导出文件固定名称
pub const EXPORT_FILE_NAME: &str = "translation.xml";

#[derive(Debug, Default)]
pub struct AppState {
    pub source_path: Option<PathBuf>,
    pub editor: Editor,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("项目解析失败: {0}")]
    Decode(#[from] DecodeError),
    #[error("编辑失败: {0}")]
    Edit(#[from] EditError),
    #[error("设置解析失败: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("状态错误: {0}")]
    State(String),
}

/// 项目概况（供命令行以 JSON 输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub name: String,
    pub version: String,
    pub active_region: String,
    pub regions: Vec<String>,
    pub groups: usize,
    pub entries: usize,
}

impl AppState {
    pub fn project(&self) -> &Project {
        self.editor.project()
    }

    /// 新建只含 `Content` 根分组的项目，丢弃当前文件路径
    pub fn new_project(&mut self, info: Info) {
        tracing::info!("新建项目: {}", info.name);
        self.editor.replace_project(Project::with_info(info));
        self.source_path = None;
    }

    /// 从文本加载项目；解析失败时保留原有项目
    pub fn load_str(&mut self, xml: &str) -> Result<(), AppError> {
        let project = decode_project(xml)?;
        self.editor.replace_project(project);
        Ok(())
    }

    /// 加载项目文件并记录为当前项目路径
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        let xml = read_text_file(p)?;
        self.load_str(&xml)?;
        self.source_path = Some(p.to_path_buf());
        let (groups, entries) = self.project().total_count();
        tracing::info!("项目加载完成: {}（{} 个分组，{} 个条目）", p.display(), groups, entries);
        Ok(())
    }

    pub fn save_string(&self) -> String {
        encode_project(self.project())
    }

    /// 将当前项目保存到指定路径
    pub fn save_to_file(&self, path: &Path) -> Result<(), AppError> {
        write_text_file(path, &self.save_string())?;
        tracing::info!("项目已保存: {}", path.display());
        Ok(())
    }

    /// 将当前项目保存到原始文件路径
    pub fn save_to_original_file(&self) -> Result<(), AppError> {
        let original_path = self
            .source_path
            .as_ref()
            .ok_or_else(|| AppError::State("项目文件路径未设置".into()))?;
        self.save_to_file(original_path)
    }

    /// 另存为：保存成功后切换当前路径
    pub fn save_as(&mut self, path: &Path) -> Result<(), AppError> {
        self.save_to_file(path)?;
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn export_string(&self) -> String {
        encode_export(self.project())
    }

    /// 导出到目录下的 `translation.xml`，返回写入的文件路径
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, AppError> {
        if !dir.is_dir() {
            return Err(AppError::State(format!("导出目录不存在: {}", dir.display())));
        }
        let target = dir.join(EXPORT_FILE_NAME);
        write_text_file(&target, &self.export_string())?;
        tracing::info!("导出完成: {}", target.display());
        Ok(target)
    }

    pub fn rename_project(&mut self, name: &str) -> Result<(), AppError> {
        self.editor.rename_project(name)?;
        Ok(())
    }

    /// 应用搜索过滤：按路径片段匹配，空条件显示全部
    pub fn apply_search_filter(&mut self, filter: &str) {
        self.editor.apply_filter(&TreeFilter::new(filter, ""));
    }

    pub fn stats(&self) -> ProjectStats {
        let project = self.project();
        let (groups, entries) = project.total_count();
        ProjectStats {
            name: project.info.name.clone(),
            version: project.info.version.clone(),
            active_region: project.info.active_region.clone(),
            regions: project.info.regions.clone(),
            groups,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    /// 创建临时项目文件用于测试
    fn create_test_project_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<data>
  <info>
    <version>1.0</version>
    <activeregion>en</activeregion>
    <regions><region>en</region><region>fr</region></regions>
    <name>demo</name>
  </info>
  <group id="Content">
    <group id="Menu">
      <entry id="Title">
        <region id="en"><page index="0"><![CDATA[Hello]]></page></region>
        <region id="fr"><page index="0"><![CDATA[Bonjour]]></page></region>
      </entry>
    </group>
  </group>
</data>
"#;

    #[test]
    fn test_load_project_file() {
        let temp_file = create_test_project_file(SAMPLE);
        let mut app_state = AppState::default();
        let result = app_state.load_file(temp_file.path());

        assert!(result.is_ok(), "加载项目应该成功");
        assert_eq!(app_state.source_path.as_deref(), Some(temp_file.path()));
        assert_eq!(app_state.project().info.name, "demo");
        assert!(app_state.project().find_entry_by_path("Menu.Title").is_some());
    }

    #[test]
    fn test_failed_load_keeps_previous_project() {
        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).expect("加载项目失败");
        let before = app_state.project().clone();

        let result = app_state.load_str("<data><info></data>");
        assert!(result.is_err(), "损坏的项目应该返回错误");
        assert_eq!(app_state.project(), &before, "失败时保留原项目");

        let missing = app_state.load_file(Path::new("/definitely/missing.dpr"));
        assert!(matches!(missing, Err(AppError::Io(_))));
        assert_eq!(app_state.project(), &before);
    }

    #[test]
    fn test_save_then_reload() {
        let dir = tempdir().expect("创建临时目录失败");
        let path = dir.path().join("demo.dpr");

        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).unwrap();
        app_state.rename_project("renamed").unwrap();
        app_state.save_as(&path).expect("保存应该成功");
        app_state.save_to_original_file().expect("保存到原路径应该成功");

        let mut reloaded = AppState::default();
        reloaded.load_file(&path).unwrap();
        assert_eq!(reloaded.project(), app_state.project());
        assert_eq!(reloaded.project().info.name, "renamed");
    }

    #[test]
    fn test_save_without_path_is_state_error() {
        let app_state = AppState::default();
        assert!(matches!(app_state.save_to_original_file(), Err(AppError::State(_))));
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempdir().expect("创建临时目录失败");
        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).unwrap();

        let target = app_state.export_to_dir(dir.path()).expect("导出应该成功");
        assert_eq!(target, dir.path().join(EXPORT_FILE_NAME));
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("<line id=\"Menu.Title\"><![CDATA[Bonjour]]></line>"));

        let missing = app_state.export_to_dir(&dir.path().join("nope"));
        assert!(matches!(missing, Err(AppError::State(_))));
    }

    #[test]
    fn test_new_project_and_stats() {
        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).unwrap();
        app_state.source_path = Some(PathBuf::from("old.dpr"));
        app_state.new_project(Info::default());

        assert!(app_state.source_path.is_none());
        let stats = app_state.stats();
        assert_eq!(stats.groups, 1, "新项目只有根分组");
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.regions, vec!["en"]);
    }

    #[test]
    fn test_search_filter() {
        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).unwrap();
        app_state.apply_search_filter("menu.title");
        let project = app_state.project();
        let title = project.find_entry_by_path("Menu.Title").unwrap();
        assert!(project.node(title).unwrap().meets_filter());

        app_state.apply_search_filter("nothing");
        let project = app_state.project();
        assert!(!project.node(title).unwrap().meets_filter());
    }
}

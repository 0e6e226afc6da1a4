//! VM桥接层：命令行宿主与 AppState 之间共用的常量和状态文本

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

// === 常量定义（消除魔法值） ===
pub const STATUS_LOADED: &str = "项目加载完成";
pub const STATUS_SAVED: &str = "项目已保存";
pub const STATUS_EXPORTED: &str = "导出完成";
pub const STATUS_ROUND_TRIP_OK: &str = "往返校验通过";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 项目文件扩展名
pub const PROJECT_EXTENSION: &str = "dpr";
/// 设置文件名（位于平台配置目录下）
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// 日志级别环境变量
pub const ENV_LOG_LEVEL: &str = "FANYI_LOG";
/// 设置文件路径覆盖
pub const ENV_SETTINGS: &str = "FANYI_SETTINGS";

/// 给缺少扩展名的项目路径补上 `.dpr`
pub fn with_project_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(PROJECT_EXTENSION)
    }
}

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "fanyi";
const APPLICATION: &str = "fanyi_xiangmu";

/// 平台配置目录，无法确定用户目录时为 None
///
/// - Linux: `$XDG_CONFIG_HOME/fanyi_xiangmu` 或 `~/.config/fanyi_xiangmu`
/// - macOS: `~/Library/Application Support/dev.fanyi.fanyi_xiangmu`
/// - Windows: `C:\Users\<User>\AppData\Roaming\fanyi\fanyi_xiangmu\config`
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// 设置文件位置：`FANYI_SETTINGS` 优先，其次平台配置目录
pub fn settings_path() -> Option<PathBuf> {
    resolve_settings_path(std::env::var_os(ENV_SETTINGS), config_dir())
}

fn resolve_settings_path(custom: Option<OsString>, config: Option<PathBuf>) -> Option<PathBuf> {
    match custom.filter(|value| !value.is_empty()) {
        Some(custom) => Some(PathBuf::from(custom)),
        None => config.map(|dir| dir.join(SETTINGS_FILE_NAME)),
    }
}

pub fn status_error(message: impl std::fmt::Display) -> String {
    format!("{STATUS_ERROR_PREFIX}{message}")
}

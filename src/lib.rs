//! 翻译项目编辑核心库
//!
//! 提供项目树模型、点分路径、结构编辑（剪切/复制/粘贴/过滤）
//! 以及项目 XML 与导出 XML 两种格式的读写

pub mod model;
pub mod utils;
pub mod vm;
pub mod xml;

// 重新导出主要类型
pub use model::data_core::{AppError, AppState, ProjectStats};
pub use model::edit::{Clipboard, EditError, Editor, Owner, TreeFilter};
pub use model::tree::{Info, Node, NodeId, NodeKind, NodeType, Page, Project, Region};
pub use xml::export::encode_export;
pub use xml::project::{decode_project, encode_project};
pub use xml::DecodeError;

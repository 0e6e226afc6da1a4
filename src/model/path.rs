//! 层级路径：由祖先标识符链计算点分路径（如 `Menu.Title`）

use crate::model::tree::{NodeId, Project, ROOT_CONTENT_ID};

/// 路径分隔符
pub const PATH_SEPARATOR: char = '.';

/// 由父路径与自身标识符推导路径
///
/// - 没有父节点（顶层分组）或标识符为保留根 id 时返回空串
/// - 父路径为空时只返回自身 id，根分组不参与路径
pub fn derive_path(parent_path: Option<&str>, id: &str) -> String {
    match parent_path {
        None => String::new(),
        Some(_) if id == ROOT_CONTENT_ID => String::new(),
        Some("") => id.to_string(),
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{id}"),
    }
}

/// 沿父引用链递归计算节点路径，不读取缓存
///
/// 节点不存在时返回空串。
pub fn compute_path(project: &Project, node: NodeId) -> String {
    let Some(current) = project.node(node) else {
        return String::new();
    };
    let parent_path = current
        .parent()
        .map(|parent| compute_path(project, parent));
    derive_path(parent_path.as_deref(), current.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_path_rules() {
        assert_eq!(derive_path(None, "Content"), "");
        assert_eq!(derive_path(None, "Other"), "", "顶层节点没有路径");
        assert_eq!(derive_path(Some(""), "Menu"), "Menu");
        assert_eq!(derive_path(Some("Menu"), "Title"), "Menu.Title");
        assert_eq!(derive_path(Some("Menu"), ROOT_CONTENT_ID), "", "保留根 id 不参与路径");
    }

    #[test]
    fn test_compute_path_matches_cached_path() {
        let mut project = Project::empty();
        let root = project.root_group().expect("应该存在根分组");
        let menu = project.insert_group(Some(root), "Menu".to_string());
        let sub = project.insert_group(Some(menu), "Main".to_string());
        let entry = project.insert_entry(sub, "Title".to_string(), Vec::new());

        assert_eq!(compute_path(&project, root), "");
        assert_eq!(compute_path(&project, menu), "Menu");
        assert_eq!(compute_path(&project, entry), "Menu.Main.Title");
        for node in [root, menu, sub, entry] {
            let cached = project.node(node).expect("节点应该存在").path().to_string();
            assert_eq!(compute_path(&project, node), cached, "缓存路径应与实时计算一致");
        }
    }
}

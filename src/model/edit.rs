//! 结构编辑：新建 / 改名 / 删除 / 剪切 / 复制 / 粘贴 / 过滤
//!
//! 所有操作先校验、后修改：返回错误时树保持原样。

use thiserror::Error;

use crate::model::path::PATH_SEPARATOR;
use crate::model::tree::{DetachedNode, NodeId, NodeType, Page, Project, Region};
use crate::utils::text::split_trailing_numerals;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("无效的父节点")]
    InvalidParent,
    #[error("不能重命名根分组")]
    InvalidRenameRoot,
    #[error("不能删除根分组")]
    InvalidDeleteRoot,
    #[error("不能剪切根分组")]
    InvalidCutRoot,
    #[error("不能复制根分组")]
    InvalidCopyRoot,
    #[error("不能在根分组下添加条目")]
    InvalidEntryInRoot,
    #[error("没有可粘贴的内容")]
    InvalidNothingToPaste,
    #[error("不能删除区域中的最后一页")]
    InvalidDeleteLastPage,
    #[error("不能粘贴到被剪切节点自身或其后代中")]
    InvalidPasteTarget,
    #[error("节点不存在: {0}")]
    NodeNotFound(NodeId),
    #[error("无效的标识符: {0:?}")]
    InvalidId(String),
    #[error("同层已存在标识符: {0}")]
    DuplicateId(String),
    #[error("区域不存在: {0}")]
    RegionNotFound(String),
    #[error("区域已存在: {0}")]
    DuplicateRegion(String),
    #[error("页码越界: {index}（共 {len} 页）")]
    PageOutOfRange { index: usize, len: usize },
}

/// 编辑目标的拥有者：项目本身或某个节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Project,
    Node(NodeId),
}

impl From<NodeId> for Owner {
    fn from(value: NodeId) -> Self {
        Owner::Node(value)
    }
}

/// 待粘贴内容：剪切记录原节点，复制记录脱离快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clipboard {
    Cut(NodeId),
    Copy(DetachedNode),
}

/// 按 id 片段与文本片段过滤（大小写不敏感，空条件视为全部匹配）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFilter {
    pub id: String,
    pub text: String,
}

impl TreeFilter {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty() && self.text.trim().is_empty()
    }

    /// 节点自身是否匹配；分组没有文本内容，只能按 id 匹配
    pub fn matches(&self, project: &Project, node: NodeId) -> bool {
        let Some(node) = project.node(node) else {
            return false;
        };
        if self.is_empty() {
            return true;
        }
        let id_filter = self.id.trim().to_lowercase();
        let text_filter = self.text.trim().to_lowercase();
        let id_ok = id_filter.is_empty()
            || node.path().to_lowercase().contains(&id_filter)
            || node.id().to_lowercase().contains(&id_filter);
        if !id_ok {
            return false;
        }
        if text_filter.is_empty() {
            return true;
        }
        node.regions()
            .iter()
            .flat_map(|region| region.pages.iter())
            .any(|page| page.text.to_lowercase().contains(&text_filter))
    }
}

/// 结构编辑器：持有项目树与唯一的剪贴槽
#[derive(Debug, Default)]
pub struct Editor {
    project: Project,
    clipboard: Option<Clipboard>,
}

impl Editor {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            clipboard: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// 整体替换项目；剪切记录指向旧树，需要丢弃，复制快照保留
    pub fn replace_project(&mut self, project: Project) {
        self.project = project;
        if matches!(self.clipboard, Some(Clipboard::Cut(_))) {
            self.clipboard = None;
        }
    }

    /// 在分组下新建子分组
    pub fn create_group(&mut self, parent: Owner, id: &str) -> Result<NodeId, EditError> {
        let parent = self.group_owner(parent)?;
        let id = validate_id(id)?;
        self.ensure_unique(Some(parent), NodeType::Group, &id, None)?;
        let node = self.project.insert_group(Some(parent), id);
        tracing::info!("新建分组: {}", self.path_of(node));
        Ok(node)
    }

    /// 在非根分组下新建条目，每个项目区域自动带一个空白页面
    pub fn create_entry(&mut self, parent: Owner, id: &str) -> Result<NodeId, EditError> {
        let parent = self.group_owner(parent)?;
        if self.project.is_root(parent) {
            return Err(EditError::InvalidParent);
        }
        let id = validate_id(id)?;
        self.ensure_unique(Some(parent), NodeType::Entry, &id, None)?;
        let regions = self
            .project
            .info
            .regions
            .iter()
            .map(Region::new_empty)
            .collect();
        let node = self.project.insert_entry(parent, id, regions);
        tracing::info!("新建条目: {}", self.path_of(node));
        Ok(node)
    }

    /// 重命名节点；自身与所有后代路径随之刷新
    pub fn rename(&mut self, node: NodeId, new_id: &str) -> Result<(), EditError> {
        let current = self.project.node(node).ok_or(EditError::NodeNotFound(node))?;
        if self.project.is_root(node) {
            return Err(EditError::InvalidRenameRoot);
        }
        let new_id = validate_id(new_id)?;
        if current.id() == new_id {
            return Ok(());
        }
        let node_type = current.node_type();
        let owner = current.parent();
        self.ensure_unique(owner, node_type, &new_id, Some(node))?;
        let old_path = self.path_of(node);
        self.project.set_id(node, new_id);
        tracing::info!("重命名: {} -> {}", old_path, self.path_of(node));
        Ok(())
    }

    /// 以递增数字后缀生成同层新 id，并在原位置旁创建深拷贝
    pub fn duplicate_id(&mut self, node: NodeId) -> Result<NodeId, EditError> {
        let current = self.project.node(node).ok_or(EditError::NodeNotFound(node))?;
        if self.project.is_root(node) {
            return Err(EditError::InvalidCopyRoot);
        }
        let parent = current.parent().ok_or(EditError::InvalidParent)?;
        let new_id = next_free_id(&self.project, Some(parent), current.node_type(), current.id());
        let mut copy = self
            .project
            .detach_copy(node)
            .ok_or(EditError::NodeNotFound(node))?;
        copy.set_id(new_id);
        let duplicate = self.project.attach(parent, copy);
        tracing::info!("复制标识: {} -> {}", self.path_of(node), self.path_of(duplicate));
        Ok(duplicate)
    }

    /// 软删除：级联设置删除标记，不摘除节点
    pub fn mark_deleted(&mut self, node: NodeId) -> Result<(), EditError> {
        self.ensure_deletable(node)?;
        self.project.set_deleted_cascade(node, true);
        tracing::debug!("标记删除: {}", self.path_of(node));
        Ok(())
    }

    /// 撤销软删除标记（用户取消确认时）
    pub fn restore(&mut self, node: NodeId) -> Result<(), EditError> {
        if !self.project.contains(node) {
            return Err(EditError::NodeNotFound(node));
        }
        self.project.set_deleted_cascade(node, false);
        if self.clipboard == Some(Clipboard::Cut(node)) {
            self.clipboard = None;
        }
        Ok(())
    }

    /// 硬删除：从父节点子列表摘除整棵子树
    pub fn remove_from_parent(&mut self, node: NodeId) -> Result<(), EditError> {
        self.ensure_deletable(node)?;
        let path = self.path_of(node);
        if let Some(Clipboard::Cut(cut)) = self.clipboard {
            if self.project.is_within(cut, node) {
                self.clipboard = None;
            }
        }
        self.project.remove_subtree(node);
        tracing::info!("删除: {}", path);
        Ok(())
    }

    /// 软删除后立即硬删除
    pub fn delete(&mut self, node: NodeId) -> Result<(), EditError> {
        self.mark_deleted(node)?;
        self.remove_from_parent(node)
    }

    /// 剪切：软删除并记录，等待粘贴时移动
    pub fn cut(&mut self, node: NodeId) -> Result<(), EditError> {
        if !self.project.contains(node) {
            return Err(EditError::NodeNotFound(node));
        }
        if self.project.is_root(node) {
            return Err(EditError::InvalidCutRoot);
        }
        if let Some(Clipboard::Cut(previous)) = self.clipboard {
            self.project.set_deleted_cascade(previous, false);
        }
        self.project.set_deleted_cascade(node, true);
        self.clipboard = Some(Clipboard::Cut(node));
        tracing::debug!("剪切: {}", self.path_of(node));
        Ok(())
    }

    /// 复制：记录子树快照，等待粘贴时克隆
    pub fn copy(&mut self, node: NodeId) -> Result<(), EditError> {
        if !self.project.contains(node) {
            return Err(EditError::NodeNotFound(node));
        }
        if self.project.is_root(node) {
            return Err(EditError::InvalidCopyRoot);
        }
        let snapshot = self
            .project
            .detach_copy(node)
            .ok_or(EditError::NodeNotFound(node))?;
        if let Some(Clipboard::Cut(previous)) = self.clipboard {
            self.project.set_deleted_cascade(previous, false);
        }
        self.clipboard = Some(Clipboard::Copy(snapshot));
        tracing::debug!("复制: {}", self.path_of(node));
        Ok(())
    }

    /// 粘贴到目标分组：剪切则移动原子树，复制则深拷贝快照
    ///
    /// 目标中已有同名同类节点时按数字后缀规则另取新 id。
    pub fn paste(&mut self, target: Owner) -> Result<NodeId, EditError> {
        let Some(clipboard) = self.clipboard.as_ref() else {
            return Err(EditError::InvalidNothingToPaste);
        };
        let (moving, node_type, id) = match clipboard {
            Clipboard::Cut(node) => {
                let cut = self
                    .project
                    .node(*node)
                    .ok_or(EditError::InvalidNothingToPaste)?;
                (Some(*node), cut.node_type(), cut.id().to_string())
            }
            Clipboard::Copy(snapshot) => (None, snapshot.node_type(), snapshot.id().to_string()),
        };

        let target = self.group_owner(target)?;
        if node_type == NodeType::Entry && self.project.is_root(target) {
            return Err(EditError::InvalidEntryInRoot);
        }
        if let Some(node) = moving {
            if self.project.is_within(target, node) {
                return Err(EditError::InvalidPasteTarget);
            }
        }
        let resolved = if self
            .project
            .has_sibling_id(Some(target), node_type, &id, moving)
        {
            next_free_id(&self.project, Some(target), node_type, &id)
        } else {
            id
        };

        let pasted = match (moving, self.clipboard.take()) {
            (Some(node), _) => {
                self.project.reparent(node, Some(target));
                self.project.set_deleted_cascade(node, false);
                if self.project.node(node).is_some_and(|n| n.id() != resolved) {
                    self.project.set_id(node, resolved);
                }
                tracing::info!("移动到: {}", self.path_of(node));
                node
            }
            (None, Some(Clipboard::Copy(snapshot))) => {
                let mut clone = snapshot.clone();
                clone.set_id(resolved);
                let node = self.project.attach(target, clone);
                // 复制内容可以多次粘贴
                self.clipboard = Some(Clipboard::Copy(snapshot));
                tracing::info!("粘贴副本: {}", self.path_of(node));
                node
            }
            (None, _) => return Err(EditError::InvalidNothingToPaste),
        };
        Ok(pasted)
    }

    /// 自上而下重算过滤标记：分组 = 自身匹配 || 任一后代匹配
    pub fn set_filter<F>(&mut self, predicate: F)
    where
        F: Fn(&Project, NodeId) -> bool,
    {
        fn apply<F: Fn(&Project, NodeId) -> bool>(
            project: &mut Project,
            node: NodeId,
            predicate: &F,
        ) -> bool {
            let own = predicate(&*project, node);
            let mut children = project.child_groups(node).to_vec();
            children.extend_from_slice(project.child_entries(node));
            let mut any_child = false;
            for child in children {
                // 不短路：每个后代都要刷新标记
                any_child |= apply(project, child, predicate);
            }
            let meets = own || any_child;
            project.set_meets_filter(node, meets);
            meets
        }

        let roots = self.project.roots().to_vec();
        for root in roots {
            apply(&mut self.project, root, &predicate);
        }
    }

    /// 按 id / 文本条件刷新过滤标记
    pub fn apply_filter(&mut self, filter: &TreeFilter) {
        self.set_filter(|project, node| filter.matches(project, node));
    }

    /// 在条目区域末尾追加一页，返回新页下标
    pub fn add_page(
        &mut self,
        entry: NodeId,
        region_id: &str,
        text: impl Into<String>,
    ) -> Result<usize, EditError> {
        let region = self.region_mut(entry, region_id)?;
        region.pages.push(Page::new(text));
        Ok(region.pages.len() - 1)
    }

    pub fn set_page_text(
        &mut self,
        entry: NodeId,
        region_id: &str,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        let region = self.region_mut(entry, region_id)?;
        let len = region.pages.len();
        let page = region
            .pages
            .get_mut(index)
            .ok_or(EditError::PageOutOfRange { index, len })?;
        page.text = text.into();
        Ok(())
    }

    /// 删除一页；区域至少保留一页
    pub fn remove_page(
        &mut self,
        entry: NodeId,
        region_id: &str,
        index: usize,
    ) -> Result<Page, EditError> {
        let region = self.region_mut(entry, region_id)?;
        let len = region.pages.len();
        if index >= len {
            return Err(EditError::PageOutOfRange { index, len });
        }
        if len <= 1 {
            return Err(EditError::InvalidDeleteLastPage);
        }
        Ok(region.pages.remove(index))
    }

    pub fn rename_project(&mut self, name: &str) -> Result<(), EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::InvalidId(name.to_string()));
        }
        tracing::info!("项目重命名: {} -> {}", self.project.info.name, name);
        self.project.info.name = name.to_string();
        Ok(())
    }

    pub fn set_active_region(&mut self, region_id: &str) -> Result<(), EditError> {
        if !self.project.info.regions.iter().any(|r| r == region_id) {
            return Err(EditError::RegionNotFound(region_id.to_string()));
        }
        self.project.info.active_region = region_id.to_string();
        Ok(())
    }

    /// 新增项目区域，并给缺少该区域的现有条目补一个空白区域
    pub fn add_region(&mut self, region_id: &str) -> Result<(), EditError> {
        let region_id = validate_id(region_id)?;
        if self.project.info.regions.contains(&region_id) {
            return Err(EditError::DuplicateRegion(region_id));
        }
        for entry in self.project.entries_depth_first() {
            if let Some(regions) = self.project.regions_mut(entry) {
                if !regions.iter().any(|r| r.id == region_id) {
                    regions.push(Region::new_empty(region_id.clone()));
                }
            }
        }
        tracing::info!("新增区域: {}", region_id);
        self.project.info.regions.push(region_id);
        Ok(())
    }

    fn region_mut(&mut self, entry: NodeId, region_id: &str) -> Result<&mut Region, EditError> {
        let regions = self
            .project
            .regions_mut(entry)
            .ok_or(EditError::NodeNotFound(entry))?;
        regions
            .iter_mut()
            .find(|region| region.id == region_id)
            .ok_or_else(|| EditError::RegionNotFound(region_id.to_string()))
    }

    /// 目标必须是一个存在的分组节点
    fn group_owner(&self, owner: Owner) -> Result<NodeId, EditError> {
        let Owner::Node(node) = owner else {
            return Err(EditError::InvalidParent);
        };
        match self.project.node(node) {
            Some(found) if found.is_group() => Ok(node),
            Some(_) => Err(EditError::InvalidParent),
            None => Err(EditError::NodeNotFound(node)),
        }
    }

    fn ensure_deletable(&self, node: NodeId) -> Result<(), EditError> {
        if !self.project.contains(node) {
            return Err(EditError::NodeNotFound(node));
        }
        if self.project.is_root(node) {
            return Err(EditError::InvalidDeleteRoot);
        }
        Ok(())
    }

    fn ensure_unique(
        &self,
        owner: Option<NodeId>,
        node_type: NodeType,
        id: &str,
        except: Option<NodeId>,
    ) -> Result<(), EditError> {
        if self.project.has_sibling_id(owner, node_type, id, except) {
            tracing::warn!("同层 {} 标识符重复: {}", node_type, id);
            return Err(EditError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    fn path_of(&self, node: NodeId) -> String {
        self.project
            .node(node)
            .map(|n| n.path().to_string())
            .unwrap_or_default()
    }
}

/// 标识符不能为空，也不能包含路径分隔符
fn validate_id(id: &str) -> Result<String, EditError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains(PATH_SEPARATOR) {
        return Err(EditError::InvalidId(id.to_string()));
    }
    Ok(trimmed.to_string())
}

/// 去掉末尾数字后，从 `末尾数字 + 1` 起找第一个同层未使用的 id
///
/// 数字递增溢出时，以整个已尝试的 id 为前缀从 1 重新计数。
pub fn next_free_id(project: &Project, owner: Option<NodeId>, node_type: NodeType, id: &str) -> String {
    let (base, number) = split_trailing_numerals(id);
    let (mut base, mut candidate) = match number.checked_add(1) {
        Some(next) => (base.to_string(), next),
        None => (id.to_string(), 1),
    };
    loop {
        let next = format!("{base}{candidate}");
        if !project.has_sibling_id(owner, node_type, &next, None) {
            return next;
        }
        candidate = match candidate.checked_add(1) {
            Some(value) => value,
            None => {
                base = next;
                1
            }
        };
    }
}

//! 项目树（Project Tree）：分组 / 条目 / 区域 / 页面的内存模型
//!
//! 节点存放在 `Project` 内部的 arena 中，以 `NodeId` 句柄互相引用；
//! 父引用是非拥有的句柄，子列表保存插入顺序。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::path::derive_path;

/// 保留的根分组标识符，不参与路径
pub const ROOT_CONTENT_ID: &str = "Content";

pub const DEFAULT_VERSION: &str = "1.0";
pub const DEFAULT_REGION: &str = "en";
pub const DEFAULT_PROJECT_NAME: &str = "translation";

/// arena 中节点的稳定句柄；被删除节点的句柄不会被复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 项目信息块（对应 `<info>`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub version: String,
    pub active_region: String,
    /// 区域标识符列表，有序且不重复
    pub regions: Vec<String>,
    pub name: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            active_region: DEFAULT_REGION.to_string(),
            regions: vec![DEFAULT_REGION.to_string()],
            name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

/// 一页译文
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub text: String,
}

impl Page {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 某个区域（语言）下的分页内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub pages: Vec<Page>,
}

impl Region {
    pub fn new(id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id: id.into(),
            pages,
        }
    }

    /// 新建区域：始终带一个空白页面
    pub fn new_empty(id: impl Into<String>) -> Self {
        Self::new(id, vec![Page::default()])
    }
}

/// 节点类别标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Group,
    Entry,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Group => f.write_str("group"),
            NodeType::Entry => f.write_str("entry"),
        }
    }
}

/// 节点内容：分组或条目（封闭变体）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Group {
        groups: Vec<NodeId>,
        entries: Vec<NodeId>,
    },
    Entry {
        regions: Vec<Region>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    /// 派生路径缓存，只在改名 / 重挂父节点时刷新
    path: String,
    parent: Option<NodeId>,
    meets_filter: bool,
    deleted: bool,
    kind: NodeKind,
}

impl Node {
    fn new(id: String, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            id,
            path: String::new(),
            parent,
            meets_filter: true,
            deleted: false,
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn meets_filter(&self) -> bool {
        self.meets_filter
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Group { .. } => NodeType::Group,
            NodeKind::Entry { .. } => NodeType::Entry,
        }
    }

    pub fn is_group(&self) -> bool {
        self.node_type() == NodeType::Group
    }

    pub fn is_entry(&self) -> bool {
        self.node_type() == NodeType::Entry
    }

    /// 条目的区域列表；分组返回空切片
    pub fn regions(&self) -> &[Region] {
        match &self.kind {
            NodeKind::Entry { regions } => regions,
            NodeKind::Group { .. } => &[],
        }
    }

    pub fn region(&self, region_id: &str) -> Option<&Region> {
        self.regions().iter().find(|region| region.id == region_id)
    }
}

/// 脱离 arena 的分组深拷贝
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedGroup {
    pub id: String,
    pub groups: Vec<DetachedGroup>,
    pub entries: Vec<DetachedEntry>,
}

impl DetachedGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// 脱离 arena 的条目深拷贝（页面按值复制）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedEntry {
    pub id: String,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetachedNode {
    Group(DetachedGroup),
    Entry(DetachedEntry),
}

impl DetachedNode {
    pub fn id(&self) -> &str {
        match self {
            DetachedNode::Group(group) => &group.id,
            DetachedNode::Entry(entry) => &entry.id,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            DetachedNode::Group(group) => group.id = id,
            DetachedNode::Entry(entry) => entry.id = id,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            DetachedNode::Group(_) => NodeType::Group,
            DetachedNode::Entry(_) => NodeType::Entry,
        }
    }
}

/// 翻译项目：信息块 + 顶层分组 + 节点 arena
#[derive(Debug, Clone)]
pub struct Project {
    pub info: Info,
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
}

impl Default for Project {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Project {
    /// 结构相等：信息块、id、嵌套、区域与页面内容及顺序一致；过滤/删除标记不参与比较
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.detached_roots() == other.detached_roots()
    }
}

impl Project {
    /// 没有任何分组的项目
    pub fn new(info: Info) -> Self {
        Self {
            info,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// 新建项目：给定信息块 + 唯一的 `Content` 根分组
    pub fn with_info(info: Info) -> Self {
        let mut project = Self::new(info);
        project.insert_group(None, ROOT_CONTENT_ID.to_string());
        project
    }

    /// 默认信息块的空项目
    pub fn empty() -> Self {
        Self::with_info(Info::default())
    }

    /// 由脱离的分组树构建项目，父引用与路径在插入时建立
    pub fn from_detached(info: Info, groups: Vec<DetachedGroup>) -> Self {
        let mut project = Self::new(info);
        for group in groups {
            project.attach_group(None, group);
        }
        project
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// 保留根分组；没有 `Content` 时退回第一个顶层分组
    pub fn root_group(&self) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|root| self.node(*root).is_some_and(|node| node.id == ROOT_CONTENT_ID))
            .or_else(|| self.roots.first().copied())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// 顶层分组（由项目直接拥有）即根节点
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| node.parent.is_none() && node.is_group())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn child_groups(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).map(Node::kind) {
            Some(NodeKind::Group { groups, .. }) => groups,
            _ => &[],
        }
    }

    pub fn child_entries(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).map(Node::kind) {
            Some(NodeKind::Group { entries, .. }) => entries,
            _ => &[],
        }
    }

    /// 某个拥有者下指定类别的子节点列表；`None` 表示项目本身
    pub fn children_of(&self, owner: Option<NodeId>, node_type: NodeType) -> &[NodeId] {
        match (owner, node_type) {
            (None, NodeType::Group) => &self.roots,
            (None, NodeType::Entry) => &[],
            (Some(owner), NodeType::Group) => self.child_groups(owner),
            (Some(owner), NodeType::Entry) => self.child_entries(owner),
        }
    }

    /// 同层同类节点中是否已有该 id（可排除某个节点自身）
    pub fn has_sibling_id(
        &self,
        owner: Option<NodeId>,
        node_type: NodeType,
        id: &str,
        except: Option<NodeId>,
    ) -> bool {
        self.children_of(owner, node_type)
            .iter()
            .filter(|sibling| Some(**sibling) != except)
            .filter_map(|sibling| self.node(*sibling))
            .any(|sibling| sibling.id == id)
    }

    /// 子树中的（分组数, 条目数），不含节点自身
    pub fn count(&self, id: NodeId) -> (usize, usize) {
        let groups = self.child_groups(id);
        let mut group_count = groups.len();
        let mut entry_count = self.child_entries(id).len();
        for group in groups {
            let (gc, ec) = self.count(*group);
            group_count += gc;
            entry_count += ec;
        }
        (group_count, entry_count)
    }

    /// 整个项目的（分组数, 条目数），包含顶层分组
    pub fn total_count(&self) -> (usize, usize) {
        self.roots.iter().fold((self.roots.len(), 0), |(gc, ec), root| {
            let (sub_groups, sub_entries) = self.count(*root);
            (gc + sub_groups, ec + sub_entries)
        })
    }

    /// 所有顶层分组下的条目，分组先于本层条目（深度优先）
    pub fn entries_depth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for root in &self.roots {
            self.collect_entries(*root, &mut out);
        }
        out
    }

    /// 单个分组子树中的条目，顺序同 `entries_depth_first`
    pub fn entries_under(&self, group: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_entries(group, &mut out);
        out
    }

    fn collect_entries(&self, group: NodeId, out: &mut Vec<NodeId>) {
        for child in self.child_groups(group) {
            self.collect_entries(*child, out);
        }
        out.extend_from_slice(self.child_entries(group));
    }

    /// 先序遍历所有活动节点（分组 -> 子分组 -> 条目）
    pub fn walk_depth_first(&self) -> Vec<NodeId> {
        fn walk(project: &Project, node: NodeId, out: &mut Vec<NodeId>) {
            out.push(node);
            for child in project.child_groups(node) {
                walk(project, *child, out);
            }
            out.extend_from_slice(project.child_entries(node));
        }
        let mut out = Vec::new();
        for root in &self.roots {
            walk(self, *root, &mut out);
        }
        out
    }

    pub fn find_group_by_path(&self, path: &str) -> Option<NodeId> {
        self.find_by_path(path, NodeType::Group)
    }

    pub fn find_entry_by_path(&self, path: &str) -> Option<NodeId> {
        self.find_by_path(path, NodeType::Entry)
    }

    fn find_by_path(&self, path: &str, node_type: NodeType) -> Option<NodeId> {
        self.walk_depth_first().into_iter().find(|id| {
            self.node(*id)
                .is_some_and(|node| node.node_type() == node_type && node.path == path)
        })
    }

    /// 节点子树的脱离深拷贝
    pub fn detach_copy(&self, id: NodeId) -> Option<DetachedNode> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Group { .. } => self.detach_group(id).map(DetachedNode::Group),
            NodeKind::Entry { regions } => Some(DetachedNode::Entry(DetachedEntry {
                id: node.id.clone(),
                regions: regions.clone(),
            })),
        }
    }

    fn detach_group(&self, id: NodeId) -> Option<DetachedGroup> {
        let node = self.node(id)?;
        let NodeKind::Group { groups, entries } = &node.kind else {
            return None;
        };
        Some(DetachedGroup {
            id: node.id.clone(),
            groups: groups.iter().filter_map(|g| self.detach_group(*g)).collect(),
            entries: entries
                .iter()
                .filter_map(|e| match self.detach_copy(*e) {
                    Some(DetachedNode::Entry(entry)) => Some(entry),
                    _ => None,
                })
                .collect(),
        })
    }

    /// 所有顶层分组的脱离深拷贝
    pub fn detached_roots(&self) -> Vec<DetachedGroup> {
        self.roots
            .iter()
            .filter_map(|root| self.detach_group(*root))
            .collect()
    }

    // === 结构变更原语（由编辑层调用并负责校验） ===

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    /// 在拥有者子列表末尾追加新分组并计算路径
    pub(crate) fn insert_group(&mut self, parent: Option<NodeId>, id: String) -> NodeId {
        let kind = NodeKind::Group {
            groups: Vec::new(),
            entries: Vec::new(),
        };
        let node = self.alloc(Node::new(id, None, kind));
        self.link(node, parent);
        node
    }

    /// 在分组末尾追加新条目并计算路径
    pub(crate) fn insert_entry(&mut self, parent: NodeId, id: String, regions: Vec<Region>) -> NodeId {
        let node = self.alloc(Node::new(id, None, NodeKind::Entry { regions }));
        self.link(node, Some(parent));
        node
    }

    /// 嫁接脱离分组，建立父引用与路径
    pub(crate) fn attach_group(&mut self, parent: Option<NodeId>, group: DetachedGroup) -> NodeId {
        let DetachedGroup {
            id,
            groups,
            entries,
        } = group;
        let node = self.insert_group(parent, id);
        for child in groups {
            self.attach_group(Some(node), child);
        }
        for entry in entries {
            self.insert_entry(node, entry.id, entry.regions);
        }
        node
    }

    pub(crate) fn attach(&mut self, parent: NodeId, detached: DetachedNode) -> NodeId {
        match detached {
            DetachedNode::Group(group) => self.attach_group(Some(parent), group),
            DetachedNode::Entry(entry) => self.insert_entry(parent, entry.id, entry.regions),
        }
    }

    /// 修改标识符并刷新自身及所有后代路径
    pub(crate) fn set_id(&mut self, id: NodeId, value: String) {
        if let Some(node) = self.node_mut(id) {
            node.id = value;
        }
        self.refresh_paths(id);
    }

    /// 自上而下刷新子树的缓存路径
    pub(crate) fn refresh_paths(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let parent_path = node
            .parent
            .and_then(|parent| self.node(parent))
            .map(|parent| parent.path.clone());
        let path = derive_path(parent_path.as_deref(), &node.id);
        if let Some(node) = self.node_mut(id) {
            node.path = path;
        }
        for child in self.child_list(id) {
            self.refresh_paths(child);
        }
    }

    fn child_list(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.child_groups(id).to_vec();
        children.extend_from_slice(self.child_entries(id));
        children
    }

    /// 从当前拥有者的子列表中按句柄摘除（不释放）
    fn unlink(&mut self, id: NodeId) {
        let Some((node_type, parent)) = self.node(id).map(|node| (node.node_type(), node.parent))
        else {
            return;
        };
        match parent {
            None => self.roots.retain(|root| *root != id),
            Some(parent) => {
                if let Some(Node {
                    kind: NodeKind::Group { groups, entries },
                    ..
                }) = self.node_mut(parent)
                {
                    match node_type {
                        NodeType::Group => groups.retain(|child| *child != id),
                        NodeType::Entry => entries.retain(|child| *child != id),
                    }
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// 追加到新拥有者末尾，设置父引用并刷新子树路径
    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        let Some(node_type) = self.node(id).map(Node::node_type) else {
            return;
        };
        match parent {
            None => self.roots.push(id),
            Some(parent) => {
                if let Some(Node {
                    kind: NodeKind::Group { groups, entries },
                    ..
                }) = self.node_mut(parent)
                {
                    match node_type {
                        NodeType::Group => groups.push(id),
                        NodeType::Entry => entries.push(id),
                    }
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }
        self.refresh_paths(id);
    }

    /// 把子树移动到新拥有者下
    pub(crate) fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        self.unlink(id);
        self.link(id, new_parent);
    }

    /// 硬删除：摘除并释放整棵子树的槽位
    pub(crate) fn remove_subtree(&mut self, id: NodeId) {
        self.unlink(id);
        self.free(id);
    }

    fn free(&mut self, id: NodeId) {
        for child in self.child_list(id) {
            self.free(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    /// 级联设置删除标记
    pub(crate) fn set_deleted_cascade(&mut self, id: NodeId, deleted: bool) {
        if let Some(node) = self.node_mut(id) {
            node.deleted = deleted;
        }
        for child in self.child_list(id) {
            self.set_deleted_cascade(child, deleted);
        }
    }

    pub(crate) fn set_meets_filter(&mut self, id: NodeId, meets: bool) {
        if let Some(node) = self.node_mut(id) {
            node.meets_filter = meets;
        }
    }

    pub(crate) fn regions_mut(&mut self, id: NodeId) -> Option<&mut Vec<Region>> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Entry { regions }) => Some(regions),
            _ => None,
        }
    }

    /// 判断 `node` 是否为 `ancestor` 自身或其后代
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> (Project, NodeId, NodeId, NodeId) {
        let mut project = Project::empty();
        let root = project.root_group().expect("应该存在根分组");
        let menu = project.insert_group(Some(root), "Menu".to_string());
        let title = project.insert_entry(menu, "Title".to_string(), vec![Region::new_empty("en")]);
        (project, root, menu, title)
    }

    #[test]
    fn test_empty_project_shape() {
        let project = Project::empty();
        assert_eq!(project.roots().len(), 1);
        let root = project.root_group().expect("应该存在根分组");
        let node = project.node(root).expect("根分组应该存在");
        assert_eq!(node.id(), ROOT_CONTENT_ID);
        assert_eq!(node.path(), "");
        assert_eq!(project.info, Info::default());
        assert!(project.is_root(root));
    }

    #[test]
    fn test_parent_links_are_consistent() {
        let (project, root, menu, title) = sample_project();
        assert_eq!(project.parent_of(menu), Some(root));
        assert_eq!(project.parent_of(title), Some(menu));
        assert!(project.child_groups(root).contains(&menu));
        assert!(project.child_entries(menu).contains(&title));
        assert_eq!(project.node(title).map(Node::path), Some("Menu.Title"));
    }

    #[test]
    fn test_set_id_refreshes_descendant_paths() {
        let (mut project, _root, menu, title) = sample_project();
        project.set_id(menu, "Main".to_string());
        assert_eq!(project.node(menu).map(Node::path), Some("Main"));
        assert_eq!(project.node(title).map(Node::path), Some("Main.Title"));
        assert_eq!(project.node(title).map(Node::id), Some("Title"), "后代 id 不变");
    }

    #[test]
    fn test_count_and_remove_subtree() {
        let (mut project, root, menu, title) = sample_project();
        project.insert_group(Some(menu), "Sub".to_string());
        assert_eq!(project.count(root), (2, 1));
        assert_eq!(project.total_count(), (3, 1));

        project.remove_subtree(menu);
        assert!(!project.contains(menu));
        assert!(!project.contains(title), "后代应该被一并释放");
        assert!(project.find_entry_by_path("Menu.Title").is_none());
        assert_eq!(project.count(root), (0, 0));
    }

    #[test]
    fn test_entries_depth_first_orders_groups_before_entries() {
        let (mut project, _root, menu, _title) = sample_project();
        let inner = project.insert_group(Some(menu), "Inner".to_string());
        project.insert_entry(inner, "Deep".to_string(), Vec::new());
        project.insert_entry(menu, "Later".to_string(), Vec::new());

        let paths: Vec<String> = project
            .entries_depth_first()
            .into_iter()
            .filter_map(|id| project.node(id).map(|n| n.path().to_string()))
            .collect();
        assert_eq!(paths, vec!["Menu.Inner.Deep", "Menu.Title", "Menu.Later"]);
    }

    #[test]
    fn test_structural_equality_ignores_flags() {
        let (mut project, _root, menu, _title) = sample_project();
        let copy = project.clone();
        project.set_deleted_cascade(menu, true);
        project.set_meets_filter(menu, false);
        assert_eq!(project, copy);
    }

    #[test]
    fn test_from_detached_builds_paths() {
        let mut menu = DetachedGroup::new("Menu");
        menu.entries.push(DetachedEntry {
            id: "Title".to_string(),
            regions: vec![Region::new("en", vec![Page::new("Hello")])],
        });
        let mut root = DetachedGroup::new(ROOT_CONTENT_ID);
        root.groups.push(menu);

        let project = Project::from_detached(Info::default(), vec![root]);
        let title = project.find_entry_by_path("Menu.Title").expect("应该能按路径找到条目");
        let node = project.node(title).expect("条目应该存在");
        assert_eq!(node.region("en").map(|r| r.pages[0].text.as_str()), Some("Hello"));
        assert!(project.parent_of(title).is_some());
    }
}

//! 导出格式：按区域扁平化，只保留点分路径与拼接后的页面文本（单向）

use crate::model::path::compute_path;
use crate::model::tree::{Project, Region};
use crate::utils::text::clean_page_text;
use crate::xml::{escape, push_line, XML_DECLARATION};

/// 页面分隔标记
pub const PAGE_BREAK_MARKER: &str = "%r";

/// 项目树 -> 导出 XML
///
/// 只导出根分组（`Content`）子树；每个项目区域输出一个 `<region>`，
/// 条目缺少该区域时不输出 `<line>`。
pub fn encode_export(project: &Project) -> String {
    let entries = project
        .root_group()
        .map(|root| project.entries_under(root))
        .unwrap_or_default();
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push_str("<data>\n");
    for region_id in &project.info.regions {
        push_line(&mut out, 1, &format!("<region id=\"{}\">", escape(region_id)));
        for entry in &entries {
            let Some(region) = project.node(*entry).and_then(|node| node.region(region_id)) else {
                continue;
            };
            let path = compute_path(project, *entry);
            push_line(
                &mut out,
                2,
                &format!(
                    "<line id=\"{}\"><![CDATA[{}]]></line>",
                    escape(&path),
                    region_content(region)
                ),
            );
        }
        push_line(&mut out, 1, "</region>");
    }
    out.push_str("</data>\n");
    tracing::debug!(
        "导出: {} 个区域，{} 个条目",
        project.info.regions.len(),
        entries.len()
    );
    out
}

/// 拼接区域内容：逐页清理，跳过空页，非空页之间插入 `%r`
pub fn region_content(region: &Region) -> String {
    region
        .pages
        .iter()
        .map(|page| clean_page_text(&page.text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_BREAK_MARKER)
}

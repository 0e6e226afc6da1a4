//! 项目格式（`.dpr`）：可无损往返的完整持久化方言

use crate::model::tree::{
    DetachedEntry, DetachedGroup, Info, NodeId, Page, Project, Region,
};
use crate::xml::{escape, parse_document, push_line, DecodeError, XmlElement, XML_DECLARATION};

/// 项目树 -> XML 文本
pub fn encode_project(project: &Project) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push_str("<data>\n");
    encode_info(&project.info, &mut out);
    for root in project.roots() {
        encode_group(project, *root, 1, &mut out);
    }
    out.push_str("</data>\n");
    out
}

fn encode_info(info: &Info, out: &mut String) {
    push_line(out, 1, "<info>");
    push_line(out, 2, &format!("<version>{}</version>", escape(&info.version)));
    push_line(
        out,
        2,
        &format!("<activeregion>{}</activeregion>", escape(&info.active_region)),
    );
    push_line(out, 2, "<regions>");
    for region in &info.regions {
        push_line(out, 3, &format!("<region>{}</region>", escape(region)));
    }
    push_line(out, 2, "</regions>");
    push_line(out, 2, &format!("<name>{}</name>", escape(&info.name)));
    push_line(out, 1, "</info>");
}

/// 子分组先于条目输出，这是格式的一部分
fn encode_group(project: &Project, group: NodeId, depth: usize, out: &mut String) {
    let Some(node) = project.node(group) else {
        return;
    };
    push_line(out, depth, &format!("<group id=\"{}\">", escape(node.id())));
    for child in project.child_groups(group) {
        encode_group(project, *child, depth + 1, out);
    }
    for entry in project.child_entries(group) {
        let Some(entry) = project.node(*entry) else {
            continue;
        };
        push_line(out, depth + 1, &format!("<entry id=\"{}\">", escape(entry.id())));
        for region in entry.regions() {
            encode_region(region, depth + 2, out);
        }
        push_line(out, depth + 1, "</entry>");
    }
    push_line(out, depth, "</group>");
}

fn encode_region(region: &Region, depth: usize, out: &mut String) {
    push_line(out, depth, &format!("<region id=\"{}\">", escape(&region.id)));
    for (index, page) in region.pages.iter().enumerate() {
        // 已知限制：文本中的 `]]>` 不做处理
        push_line(
            out,
            depth + 1,
            &format!("<page index=\"{index}\"><![CDATA[{}]]></page>", page.text),
        );
    }
    push_line(out, depth, "</region>");
}

/// XML 文本 -> 项目树；父引用与路径在构建过程中建立
pub fn decode_project(xml: &str) -> Result<Project, DecodeError> {
    let data = parse_document(xml)?;
    if data.name != "data" {
        return Err(DecodeError::UnexpectedRoot(data.name));
    }
    let info = decode_info(data.required_child("info")?)?;
    let groups = data
        .children_named("group")
        .map(decode_group)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("解码项目: {}，顶层分组 {} 个", info.name, groups.len());
    Ok(Project::from_detached(info, groups))
}

fn decode_info(info: &XmlElement) -> Result<Info, DecodeError> {
    let regions = info
        .required_child("regions")?
        .children_named("region")
        .map(|region| region.value().to_string())
        .collect();
    Ok(Info {
        version: info.required_child("version")?.value().to_string(),
        active_region: info.required_child("activeregion")?.value().to_string(),
        regions,
        name: info.required_child("name")?.value().to_string(),
    })
}

fn decode_group(group: &XmlElement) -> Result<DetachedGroup, DecodeError> {
    let id = group.required_attr("group", "id")?.to_string();
    let groups = group
        .children_named("group")
        .map(decode_group)
        .collect::<Result<Vec<_>, _>>()?;
    let entries = group
        .children_named("entry")
        .map(decode_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DetachedGroup {
        id,
        groups,
        entries,
    })
}

fn decode_entry(entry: &XmlElement) -> Result<DetachedEntry, DecodeError> {
    let id = entry.required_attr("entry", "id")?.to_string();
    let regions = entry
        .children_named("region")
        .map(decode_region)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DetachedEntry { id, regions })
}

/// 没有 `<page>` 的区域补一个空白页
fn decode_region(region: &XmlElement) -> Result<Region, DecodeError> {
    let id = region.required_attr("region", "id")?;
    let mut pages: Vec<Page> = region
        .children_named("page")
        .map(|page| Page::new(page.value()))
        .collect();
    if pages.is_empty() {
        pages.push(Page::default());
    }
    Ok(Region::new(id, pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::edit::Editor;

    fn sample_project() -> Project {
        let mut editor = Editor::new(Project::empty());
        editor.add_region("fr").unwrap();
        let root = editor.project().root_group().unwrap();
        let menu = editor.create_group(root.into(), "Menu").unwrap();
        let sub = editor.create_group(menu.into(), "Sub").unwrap();
        let title = editor.create_entry(menu.into(), "Title").unwrap();
        editor.create_entry(sub.into(), "Deep").unwrap();
        editor.set_page_text(title, "en", 0, "  Hello <b>&</b>\n").unwrap();
        editor.add_page(title, "en", "World").unwrap();
        editor.into_project()
    }

    #[test]
    fn test_encode_layout() {
        let xml = encode_project(&sample_project());
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("    <version>1.0</version>\n"));
        assert!(xml.contains("      <region>fr</region>\n"));
        assert!(xml.contains("  <group id=\"Content\">\n"));
        assert!(xml.contains("<page index=\"1\"><![CDATA[World]]></page>"));
        assert!(xml.contains("<![CDATA[  Hello <b>&</b>\n]]>"), "页面文本原样包在 CDATA 中");

        let sub_at = xml.find("<group id=\"Sub\">").unwrap();
        let title_at = xml.find("<entry id=\"Title\">").unwrap();
        assert!(sub_at < title_at, "子分组应先于条目");
        assert!(xml.ends_with("</data>\n"));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let project = sample_project();
        let decoded = decode_project(&encode_project(&project)).expect("解码应该成功");
        assert_eq!(decoded, project);

        let title = decoded.find_entry_by_path("Menu.Title").expect("应该能找到条目");
        let region = decoded.node(title).unwrap().region("en").unwrap();
        assert_eq!(region.pages[0].text, "  Hello <b>&</b>\n");
        assert!(decoded.find_entry_by_path("Menu.Sub.Deep").is_some());
    }

    #[test]
    fn test_round_trip_escapes_attribute_text() {
        let mut editor = Editor::new(Project::empty());
        editor.rename_project("Tom & \"Jerry\"").unwrap();
        let root = editor.project().root_group().unwrap();
        editor.create_group(root.into(), "<g>").unwrap();
        let project = editor.into_project();
        let decoded = decode_project(&encode_project(&project)).unwrap();
        assert_eq!(decoded, project);
        assert_eq!(decoded.info.name, "Tom & \"Jerry\"");
    }

    #[test]
    fn test_decode_normalizes_single_and_missing_children() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<data>
<info><version>2.0</version><activeregion>fr</activeregion>
<regions><region>fr</region></regions><name>demo</name></info>
<group id="Content">
<group id="Menu">
<entry id="Empty"><region id="fr"></region></entry>
<entry id="One"><region id="fr"><page index="0"><![CDATA[Bonjour]]></page></region></entry>
</group>
</group>
</data>"#;
        let project = decode_project(xml).expect("解码应该成功");
        assert_eq!(project.info.regions, vec!["fr"]);
        assert_eq!(project.info.version, "2.0");

        let empty = project.find_entry_by_path("Menu.Empty").unwrap();
        assert_eq!(
            project.node(empty).unwrap().region("fr").unwrap().pages,
            vec![Page::default()],
            "没有页面时补一个空白页"
        );
        let one = project.find_entry_by_path("Menu.One").unwrap();
        let menu = project.find_group_by_path("Menu").unwrap();
        assert_eq!(project.parent_of(one), Some(menu));
        assert_eq!(project.count(menu), (0, 2));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_project("<root/>"),
            Err(DecodeError::UnexpectedRoot(name)) if name == "root"
        ));
        assert!(matches!(
            decode_project("<data><group id=\"x\"/></data>"),
            Err(DecodeError::MissingElement("info"))
        ));
        let missing_id = "<data><info><version>1</version><activeregion>en</activeregion>\
            <regions/><name>n</name></info><group/></data>";
        assert!(matches!(
            decode_project(missing_id),
            Err(DecodeError::MissingAttribute { element: "group", attribute: "id" })
        ));
        assert!(decode_project("<data><info>").is_err());
    }
}

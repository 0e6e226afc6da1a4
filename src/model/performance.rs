//! 性能基准测试模块
//!
//! 用于测试大项目的生成、编码、解码与导出性能

use std::time::Instant;

use crate::model::edit::{EditError, Editor, TreeFilter};
use crate::model::tree::{Info, NodeId, Project};
use crate::xml::export::encode_export;
use crate::xml::project::{decode_project, encode_project};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成大型测试项目：每个分组 `width` 个子分组（逐层减半）与 `width` 个条目
pub fn generate_large_project(depth: usize, width: usize) -> Result<Project, EditError> {
    fn fill(
        editor: &mut Editor,
        group: NodeId,
        current_depth: usize,
        max_depth: usize,
        width: usize,
    ) -> Result<(), EditError> {
        if current_depth >= max_depth {
            return Ok(());
        }
        let regions = editor.project().info.regions.clone();
        for i in 0..width {
            let entry = editor.create_entry(group.into(), &format!("entry_{i}"))?;
            for region in &regions {
                editor.set_page_text(entry, region, 0, format!("{region} 文本 {i}"))?;
                if i % 3 == 0 {
                    editor.add_page(entry, region, format!("第二页 {i}"))?;
                }
            }
        }
        for i in 0..width / 2 {
            let child = editor.create_group(group.into(), &format!("group_{i}"))?;
            fill(editor, child, current_depth + 1, max_depth, width / 2)?;
        }
        Ok(())
    }

    let info = Info {
        regions: vec!["en".to_string(), "fr".to_string()],
        name: format!("benchmark_{depth}x{width}"),
        ..Info::default()
    };
    let mut editor = Editor::new(Project::with_info(info));
    let root = editor.project().root_group().ok_or(EditError::InvalidParent)?;
    // 根分组下不能直接放条目
    for i in 0..width.max(1) {
        let top = editor.create_group(root.into(), &format!("top_{i}"))?;
        fill(&mut editor, top, 0, depth, width)?;
    }
    Ok(editor.into_project())
}

/// 测试项目编码性能
pub fn benchmark_encode(project: &Project) -> PerformanceResult {
    let start = Instant::now();
    let xml = encode_project(project);
    let duration = start.elapsed();

    PerformanceResult::new(
        "项目编码",
        duration.as_millis(),
        !xml.is_empty(),
        &format!("输出 {} 字节", xml.len()),
    )
}

/// 测试项目解码性能
pub fn benchmark_decode(xml: &str) -> PerformanceResult {
    let start = Instant::now();
    let result = decode_project(xml);
    let duration = start.elapsed();

    match result {
        Ok(project) => {
            let (groups, entries) = project.total_count();
            PerformanceResult::new(
                "项目解码",
                duration.as_millis(),
                true,
                &format!("{groups} 个分组，{entries} 个条目"),
            )
        }
        Err(e) => PerformanceResult::new(
            "项目解码",
            duration.as_millis(),
            false,
            &format!("解码失败: {e}"),
        ),
    }
}

/// 测试导出性能
pub fn benchmark_export(project: &Project) -> PerformanceResult {
    let start = Instant::now();
    let xml = encode_export(project);
    let duration = start.elapsed();

    PerformanceResult::new(
        "导出",
        duration.as_millis(),
        xml.contains("<region"),
        &format!("输出 {} 字节", xml.len()),
    )
}

/// 测试过滤标记刷新性能
pub fn benchmark_filter(project: Project, filter: &TreeFilter) -> PerformanceResult {
    let mut editor = Editor::new(project);
    let start = Instant::now();
    editor.apply_filter(filter);
    let duration = start.elapsed();

    let visible = editor
        .project()
        .walk_depth_first()
        .into_iter()
        .filter(|id| editor.project().node(*id).is_some_and(|n| n.meets_filter()))
        .count();
    PerformanceResult::new(
        "过滤",
        duration.as_millis(),
        true,
        &format!("{visible} 个节点可见"),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // 测试不同规模的数据
    let test_cases = [
        (2, 8),  // 小型
        (3, 16), // 中型
        (4, 16), // 大型
    ];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let start = Instant::now();
        let project = match generate_large_project(depth, width) {
            Ok(project) => project,
            Err(e) => {
                results.push(PerformanceResult::new(
                    &format!("数据生成({depth}x{width})"),
                    start.elapsed().as_millis(),
                    false,
                    &format!("生成失败: {e}"),
                ));
                continue;
            }
        };
        let (groups, entries) = project.total_count();
        results.push(PerformanceResult::new(
            &format!("数据生成({depth}x{width})"),
            start.elapsed().as_millis(),
            true,
            &format!("{groups} 个分组，{entries} 个条目"),
        ));

        results.push(benchmark_encode(&project));
        results.push(benchmark_decode(&encode_project(&project)));
        results.push(benchmark_export(&project));
        results.push(benchmark_filter(project, &TreeFilter::new("entry_1", "")));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_large_project() {
        let project = generate_large_project(2, 4).expect("生成测试项目失败");
        let (groups, entries) = project.total_count();
        assert!(groups > 1);
        assert!(entries > 0);
        assert!(project.find_entry_by_path("top_0.entry_0").is_some());
        assert!(project.find_group_by_path("top_0.group_0").is_some());
    }

    #[test]
    fn test_performance_benchmarks() {
        let project = generate_large_project(2, 6).expect("生成测试项目失败");

        let encode_result = benchmark_encode(&project);
        assert!(encode_result.success);
        assert!(encode_result.duration_ms < 1000); // 应该在1秒内完成

        let decode_result = benchmark_decode(&encode_project(&project));
        assert!(decode_result.success, "{}", decode_result.details);
        assert!(decode_result.duration_ms < 1000);

        assert!(benchmark_export(&project).success);
    }

    #[test]
    fn test_generated_project_round_trips() {
        let project = generate_large_project(2, 4).expect("生成测试项目失败");
        let decoded = decode_project(&encode_project(&project)).expect("解码应该成功");
        assert_eq!(decoded, project);
    }

    #[test]
    fn test_performance_suite_runs_every_case() {
        let results = run_performance_suite();
        assert_eq!(results.len(), 3 * 5, "每个规模 5 项测试");
        for result in &results {
            assert!(result.success, "{} 失败: {}", result.operation, result.details);
        }
    }
}

//! 程序入口：初始化日志、解析命令行，并驱动 AppState

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use fanyi_xiangmu::model::data_core::AppState;
use fanyi_xiangmu::model::edit::Owner;
use fanyi_xiangmu::model::performance::run_performance_suite;
use fanyi_xiangmu::model::tree::Info;
use fanyi_xiangmu::utils::settings::EditorSettings;
use fanyi_xiangmu::vm::bridge::*;
use fanyi_xiangmu::xml::project::{decode_project, encode_project};

/// 翻译项目编辑工具
#[derive(Parser, Debug)]
#[command(name = "fanyi_xiangmu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 新建空项目（只含 Content 根分组）
    New(NewArgs),
    /// 导出为按区域扁平化的 translation.xml
    Export {
        project: PathBuf,
        /// 导出目录，默认取设置中的目录或项目所在目录
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// 以 JSON 输出项目概况
    Stats { project: PathBuf },
    /// 解码 -> 编码 -> 再解码，校验往返无损
    Check { project: PathBuf },
    /// 打开最近一次使用的项目
    Reopen,
    /// 运行生成 / 编码 / 解码 / 导出 / 过滤性能测试
    Bench,
    /// 在分组下新建子分组（父路径为空时指根分组）
    AddGroup {
        project: PathBuf,
        parent: String,
        id: String,
    },
    /// 在分组下新建条目，可选地写入当前区域的第一页
    AddEntry {
        project: PathBuf,
        parent: String,
        id: String,
        #[arg(short, long)]
        text: Option<String>,
    },
}

#[derive(Args, Debug)]
struct NewArgs {
    path: PathBuf,
    /// 项目名称
    #[arg(short, long)]
    name: Option<String>,
    /// 项目区域，可重复；缺省时取设置中的默认区域
    #[arg(short, long = "region")]
    regions: Vec<String>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        std::env::var(ENV_LOG_LEVEL)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(tracing::Level::INFO)
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_file = settings_path();
    let mut settings = match &settings_file {
        Some(path) => EditorSettings::load(path)
            .with_context(|| format!("读取设置失败: {}", path.display()))?,
        None => {
            tracing::warn!("无法确定配置目录，本次不读写设置文件");
            EditorSettings::default()
        }
    };

    let result = run(cli.command, &mut settings);
    if let Err(e) = &result {
        tracing::error!("{}", status_error(e));
    }
    result?;

    if let Some(path) = &settings_file {
        if let Err(e) = settings.save(path) {
            tracing::warn!("保存设置失败: {}", e);
        }
    }
    Ok(())
}

fn run(command: Command, settings: &mut EditorSettings) -> anyhow::Result<()> {
    match command {
        Command::New(args) => new_project(args, settings),
        Command::Export { project, out } => {
            let state = open(&project, settings)?;
            let dir = out
                .or_else(|| settings.export_dir.clone())
                .or_else(|| project.parent().map(Path::to_path_buf))
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from("."));
            let target = state.export_to_dir(&dir)?;
            println!("{STATUS_EXPORTED}: {}", target.display());
            Ok(())
        }
        Command::Stats { project } => {
            let state = open(&project, settings)?;
            println!("{}", serde_json::to_string_pretty(&state.stats())?);
            Ok(())
        }
        Command::Check { project } => check(&project),
        Command::Bench => {
            let results = run_performance_suite();
            for result in &results {
                println!(
                    "{} {:>6}ms  {}  {}",
                    if result.success { "✓" } else { "✗" },
                    result.duration_ms,
                    result.operation,
                    result.details
                );
            }
            if results.iter().any(|result| !result.success) {
                return Err(anyhow!("部分性能测试失败"));
            }
            Ok(())
        }
        Command::Reopen => {
            let last = settings
                .last_project
                .clone()
                .ok_or_else(|| anyhow!("没有最近打开的项目"))?;
            let state = open(&last, settings)?;
            println!("{STATUS_LOADED}: {}", last.display());
            println!("{}", serde_json::to_string_pretty(&state.stats())?);
            Ok(())
        }
        Command::AddGroup {
            project,
            parent,
            id,
        } => {
            let mut state = open(&project, settings)?;
            let parent = find_parent(&state, &parent)?;
            state.editor.create_group(parent, &id)?;
            state.save_to_original_file()?;
            println!("{STATUS_SAVED}: {}", project.display());
            Ok(())
        }
        Command::AddEntry {
            project,
            parent,
            id,
            text,
        } => {
            let mut state = open(&project, settings)?;
            let parent = find_parent(&state, &parent)?;
            let entry = state.editor.create_entry(parent, &id)?;
            if let Some(text) = text {
                let region = state.project().info.active_region.clone();
                state.editor.set_page_text(entry, &region, 0, text)?;
            }
            state.save_to_original_file()?;
            println!("{STATUS_SAVED}: {}", project.display());
            Ok(())
        }
    }
}

fn new_project(args: NewArgs, settings: &mut EditorSettings) -> anyhow::Result<()> {
    let path = with_project_extension(&args.path);
    let regions = if args.regions.is_empty() {
        settings.default_regions.clone()
    } else {
        args.regions
    };
    let mut info = Info {
        regions,
        ..Info::default()
    };
    if let Some(first) = info.regions.first() {
        info.active_region = first.clone();
    }
    if let Some(name) = args.name {
        info.name = name;
    }

    let mut state = AppState::default();
    state.new_project(info);
    state.save_as(&path)?;
    settings.remember_project(&path);
    println!("{STATUS_SAVED}: {}", path.display());
    Ok(())
}

fn open(path: &Path, settings: &mut EditorSettings) -> anyhow::Result<AppState> {
    let mut state = AppState::default();
    state
        .load_file(path)
        .with_context(|| format!("打开项目失败: {}", path.display()))?;
    settings.remember_project(path);
    Ok(state)
}

fn check(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("读取项目失败: {}", path.display()))?;
    let first = decode_project(&text)?;
    let second = decode_project(&encode_project(&first))?;
    if first != second {
        return Err(anyhow!("往返后项目内容不一致: {}", path.display()));
    }
    let (groups, entries) = first.total_count();
    println!("{STATUS_ROUND_TRIP_OK}: {groups} 个分组，{entries} 个条目");
    Ok(())
}

/// 按点分路径查找父分组；空路径指向根分组
fn find_parent(state: &AppState, path: &str) -> anyhow::Result<Owner> {
    let project = state.project();
    let found = if path.is_empty() {
        project.root_group()
    } else {
        project.find_group_by_path(path)
    };
    found
        .map(Owner::from)
        .ok_or_else(|| anyhow!("分组不存在: {path}"))
}

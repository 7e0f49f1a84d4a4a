// ==========================================
// O2O 门店商品分析 - 命令行入口
// ==========================================
// 用法:
//   store-analyzer --inputs a.xlsx b.csv --stores 旗舰店 社区店 --output 周报
// 退出码: 至少一个门店成功为 0，否则为 1
// ==========================================

use anyhow::{Context, Result};
use clap::Parser;
use o2o_store_analyzer::app::{run_batch, BatchOptions};
use o2o_store_analyzer::config::AnalysisConfig;
use o2o_store_analyzer::logging::{self, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// O2O 门店商品分析 - 多门店 SKU 结构与经营指标报表
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// 门店商品导出文件（xlsx / csv），每个门店一个
    #[arg(short, long, num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,

    /// 门店名称，与 --inputs 按位置对应（缺省取文件名）
    #[arg(short, long, num_args = 1..)]
    stores: Vec<String>,

    /// 输出文件名或路径（默认: 门店分析报告.xlsx）
    #[arg(short, long)]
    output: Option<String>,

    /// 输出目录（默认: reports）
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// 分析参数 JSON 文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json_log: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(p) => AnalysisConfig::from_json_file(p)
            .with_context(|| format!("加载配置失败: {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    config.validate().context("配置校验失败")?;
    Ok(config)
}

fn run(args: Args) -> Result<bool> {
    let config = load_config(args.config.as_ref())?;

    let summary = run_batch(BatchOptions {
        inputs: args.inputs,
        stores: args.stores,
        output: args.output,
        output_dir: args.output_dir,
        config,
    })
    .context("报表导出失败")?;

    for failure in &summary.failed {
        error!(store = %failure.store, file = %failure.input.display(), reason = %failure.reason, "门店未纳入报表");
    }
    if let Some(path) = &summary.report_path {
        info!(path = %path.display(), stores = summary.succeeded.len(), "报表已写入");
        println!("{}", path.display());
    }

    Ok(summary.has_success())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_with(if args.json_log { LogFormat::Json } else { LogFormat::Text });

    info!("{} v{}", o2o_store_analyzer::APP_NAME, o2o_store_analyzer::VERSION);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("没有任何门店分析成功");
            ExitCode::FAILURE
        }
        Err(e) => {
            let detail = format!("{:#}", e);
            error!(error = %detail, "运行失败");
            ExitCode::FAILURE
        }
    }
}

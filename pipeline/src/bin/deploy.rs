use anyhow::Result;
use clap::Parser;
use pipeline::stages::Deploy;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 5：通过 SSH 把 staging 里的版本提升到 prod 并重启服务容器。
#[derive(Parser, Debug)]
#[command(name = "deploy", about = "将 staging/<version> 复制到 prod 并重启服务")]
struct Args {
    /// 工作目录（model_version.txt 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// 服务容器名称
    #[arg(long, default_value = "model_serving")]
    container: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let ctx = StageCtx::new(args.data_dir);
    run_stage(
        &Deploy {
            container: args.container,
        },
        &ctx,
    )
}

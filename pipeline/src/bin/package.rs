use anyhow::Result;
use clap::Parser;
use pipeline::stages::Package;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 4：按版本号打包模型并上传到远端 staging 目录。
/// 远端连接信息从环境变量（或 .env）读取。
#[derive(Parser, Debug)]
#[command(name = "package", about = "打包模型并通过 SFTP 上传到 staging/<version>")]
struct Args {
    /// 工作目录（training_data/ 与 model_version.txt 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let ctx = StageCtx::new(args.data_dir);
    run_stage(&Package, &ctx)
}

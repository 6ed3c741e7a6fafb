use anyhow::Result;
use clap::Parser;
use ml::TrainConfig;
use pipeline::stages::Retrain;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 6：下载 staging 模型并重训，回归时中止交接。
/// 在完整流程中替代 train 阶段运行。
#[derive(Parser, Debug)]
#[command(name = "retrain", about = "重训 staging 里的模型，不超过基线则失败")]
struct Args {
    /// 工作目录（training_data/ 与 model_version.txt 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// 重训轮数
    #[arg(long, default_value_t = 5)]
    epochs: usize,

    /// batch 大小
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Adam 学习率
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// 随机种子（控制坏数据的打乱方式）
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = TrainConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        seed: args.seed,
    };

    let ctx = StageCtx::new(args.data_dir);
    run_stage(&Retrain { config }, &ctx)
}

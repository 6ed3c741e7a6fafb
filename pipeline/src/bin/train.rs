use anyhow::Result;
use clap::Parser;
use ml::TrainConfig;
use pipeline::stages::Train;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 2：训练模型并导出到 training_data/trained_model/。
#[derive(Parser, Debug)]
#[command(name = "train", about = "在 build 阶段的数据上训练 CNN 分类器")]
struct Args {
    /// 工作目录（training_data/ 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// 训练轮数
    #[arg(long, default_value_t = 5)]
    epochs: usize,

    /// batch 大小
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Adam 学习率
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// 随机种子
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
    run_stage(&Train { config }, &ctx)
}

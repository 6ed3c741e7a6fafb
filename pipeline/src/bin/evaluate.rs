use anyhow::Result;
use clap::Parser;
use pipeline::stages::Evaluate;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 3：在测试集上评估模型，准确率低于阈值时以非零码退出。
#[derive(Parser, Debug)]
#[command(name = "evaluate", about = "流水线的质量门：测试集准确率检查")]
struct Args {
    /// 工作目录（training_data/ 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// 准确率阈值，恰好等于时通过
    #[arg(long, default_value_t = 0.8)]
    min_accuracy: f32,

    /// 评估时的 batch 大小
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let ctx = StageCtx::new(args.data_dir);
    run_stage(
        &Evaluate {
            min_accuracy: args.min_accuracy,
            batch_size: args.batch_size,
        },
        &ctx,
    )
}

use anyhow::Result;
use clap::Parser;
use pipeline::stages::{Build, DataSource};
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 1：准备数据集并写出四个数组工件。
#[derive(Parser, Debug)]
#[command(name = "build", about = "加载并归一化数据集，序列化到 training_data/")]
struct Args {
    /// 工作目录（training_data/ 与 model_version.txt 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Fashion-MNIST IDX 文件所在目录（与 --synthetic 二选一）
    #[arg(long, conflicts_with = "synthetic")]
    idx_dir: Option<PathBuf>,

    /// 使用确定性的合成数据代替真实数据集
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// 合成模式下的训练样本数
    #[arg(long, default_value_t = 200)]
    samples: usize,

    /// 合成模式下的类别数
    #[arg(long, default_value_t = 2)]
    classes: usize,

    /// 合成模式下的随机种子
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = if args.synthetic {
        DataSource::Synthetic {
            samples: args.samples,
            classes: args.classes,
            seed: args.seed,
        }
    } else {
        let dir = args.idx_dir.unwrap_or_else(|| PathBuf::from("data/fashion"));
        DataSource::Idx { dir }
    };

    let ctx = StageCtx::new(args.data_dir);
    run_stage(&Build { source }, &ctx)
}

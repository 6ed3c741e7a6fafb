use anyhow::Result;
use clap::Parser;
use pipeline::stages::TestDeployed;
use pipeline::{StageCtx, run_stage};
use std::path::PathBuf;

/// 阶段 7：向线上推理端点发送几张测试图像，确认部署链路通畅。
#[derive(Parser, Debug)]
#[command(name = "test_deployed", about = "对已部署的模型做一次冒烟推理")]
struct Args {
    /// 工作目录（training_data/ 所在位置）
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// 推理服务主机名，缺省时读 DEPLOY_SERVER_HOSTNAME
    #[arg(long)]
    hostname: Option<String>,

    /// 推理服务端口
    #[arg(long, default_value_t = 8501)]
    port: u16,

    /// 服务端加载的模型名称
    #[arg(long, default_value = "my_model")]
    model_name: String,

    /// 发送的样本数量
    #[arg(long, default_value_t = 3)]
    count: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let hostname = match args.hostname {
        Some(hostname) => hostname,
        None => remote::hostname_from_env()?,
    };

    let ctx = StageCtx::new(args.data_dir);
    run_stage(
        &TestDeployed {
            hostname,
            port: args.port,
            model_name: args.model_name,
            count: args.count,
        },
        &ctx,
    )
}

use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::{Context, Result};
use ml::load_export;
use remote::{DeployConfig, RemoteSession, staging_path};
use tempfile::TempDir;

/// 阶段 4：打包并上传到 staging。
///
/// 重新加载模型（顺带验证工件完整），按版本号导出到临时目录，
/// 再把整个目录递归上传到 `<base>/staging/<version>`。
/// CI 的工作目录不会保留到下一次运行，所以模型必须存到中心文件存储。
pub struct Package;

impl Stage for Package {
    fn label(&self) -> &str {
        "package"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let config = DeployConfig::from_env()?;
        let version = ctx.read_version()?;

        // 不直接上传已有目录：导出一份按版本命名的拷贝，
        // 以后需要换导出格式或参数时只改这里
        let (model, meta) = load_export(&ctx.model_export_dir())?;
        let temp_dir = TempDir::new().context("无法创建临时目录")?;
        let export_path = temp_dir.path().join(format!("model-{version}"));
        ml::save_export(&export_path, &model, &meta)?;

        let remote_path = staging_path(&config.base_path, &version);
        println!("Uploading model to: {remote_path}");

        let session = RemoteSession::connect(&config)?;
        session.mkdir_p(&remote_path)?;
        session.put_dir(&export_path, &remote_path)?;

        println!("\n已保存模型版本：{version}");
        Ok(())
    }
}

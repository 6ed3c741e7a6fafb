use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::{Result, ensure};
use remote::{DeployConfig, RemoteSession, deploy_command};

/// 阶段 5：部署。
///
/// 把 staging 里最新打包的版本复制到 prod（保留 staging 作为历史），
/// 前后分别停止和重启服务容器。所有命令拼成一条 `&&` 链，
/// 任何一步失败都会中断后续命令。
pub struct Deploy {
    /// 服务容器的名称。
    pub container: String,
}

impl Stage for Deploy {
    fn label(&self) -> &str {
        "deploy"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let config = DeployConfig::from_env()?;
        let version = ctx.read_version()?;

        let command = deploy_command(&config.base_path, &version, &self.container);
        println!("Deployment command commencing: {command}");

        let session = RemoteSession::connect(&config)?;
        let (stdout, stderr) = session.exec(&command)?;
        println!("{stdout}");

        // 远端任何 stderr 输出都视为部署失败
        ensure!(stderr.is_empty(), "远程部署命令报错：{stderr}");
        Ok(())
    }
}

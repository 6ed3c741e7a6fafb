use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::{Context, Result, ensure};
use ml::{FashionDataset, TrainConfig, dataset, load_export_for_training, training};
use remote::{DeployConfig, RemoteSession, staging_path};
use tempfile::TempDir;

/// 阶段 6：重训，替代完整流程中的 train 阶段。
///
/// 从 staging 下载已发布的模型，先测一次基线准确率，再用“新数据”
/// 继续训练 5 轮后复测。这个演示没有真正的新数据，所以把现有训练
/// 数据的图像与标签各自独立打乱，模拟拿到一批坏数据。
/// 复测没有超过基线时中止交接，不覆盖本地模型工件——
/// 这是流水线里唯一的回归保护。
pub struct Retrain {
    pub config: TrainConfig,
}

impl Stage for Retrain {
    fn label(&self) -> &str {
        "retrain"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let deploy_config = DeployConfig::from_env()?;
        let version = ctx.read_version()?;

        let remote_path = staging_path(&deploy_config.base_path, &version);
        let temp_dir = TempDir::new().context("无法创建临时目录")?;
        println!("从 {remote_path} 下载模型……");

        let session = RemoteSession::connect(&deploy_config)?;
        session.get_dir(&remote_path, temp_dir.path())?;

        // 模型就在下载目录本身（get_dir 把远端目录的内容放在这里）
        let (model, meta) = load_export_for_training(temp_dir.path())?;
        println!("模型参数量：{}", training::num_params(&model));

        let (test_images, test_labels) = ctx.load_test()?;
        let test_dataset = FashionDataset::from_arrays(test_images, test_labels)?;
        let baseline = training::evaluate(&model, &test_dataset, self.config.batch_size)?;
        println!("重训前测试准确率：{:.4}", baseline.accuracy());

        let (mut train_images, mut train_labels) = ctx.load_train()?;
        dataset::decorrelate(&mut train_images, &mut train_labels, self.config.seed);
        let bad_batch = FashionDataset::from_arrays(train_images, train_labels)?;

        let model = training::fit(model, &bad_batch, &self.config)?;
        let retrained = training::evaluate(&model, &test_dataset, self.config.batch_size)?;
        println!("重训后测试准确率：{:.4}", retrained.accuracy());

        ensure!(
            improved(baseline.accuracy(), retrained.accuracy()),
            "重训后的模型没有超过基线（{:.4} -> {:.4}），不打包也不部署",
            baseline.accuracy(),
            retrained.accuracy()
        );

        let export_dir = ctx.model_export_dir();
        ml::save_export(&export_dir, &training::to_inference(model), &meta)?;
        println!("重训模型已覆盖 {}", export_dir.display());
        Ok(())
    }
}

/// 回归判定：必须严格超过基线，持平也算退化。
fn improved(baseline: f32, retrained: f32) -> bool {
    retrained > baseline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_accuracy_counts_as_regression() {
        assert!(!improved(0.9, 0.9));
        assert!(!improved(0.9, 0.85));
        assert!(improved(0.9, 0.91));
    }
}

use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::Result;
use ml::dataset;
use std::path::PathBuf;

/// 数据来源：真实的 Fashion-MNIST IDX 文件，或确定性的合成数据。
///
/// 真实场景里数据来自数据仓库的 ETL 输出；这里用基准数据集代替，
/// 合成模式用于本地演示与 CI 冒烟。
pub enum DataSource {
    Idx { dir: PathBuf },
    Synthetic { samples: usize, classes: usize, seed: u64 },
}

/// 阶段 1：准备数据集。
///
/// 加载原始数据，归一化到 `[0, 1]`，整理成 (N, H, W, 1)，
/// 把四个数组序列化到 `training_data/` 供后续阶段使用。
pub struct Build {
    pub source: DataSource,
}

impl Stage for Build {
    fn label(&self) -> &str {
        "build"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let (train_images, train_labels, test_images, test_labels) = match &self.source {
            DataSource::Idx { dir } => dataset::load_fashion_dir(dir)?,
            DataSource::Synthetic {
                samples,
                classes,
                seed,
            } => {
                let (train_images, train_labels) = dataset::synthetic(*samples, *classes, *seed)?;
                let test_samples = (*samples / 5).max(*classes);
                let (test_images, test_labels) =
                    dataset::synthetic(test_samples, *classes, seed.wrapping_add(1))?;
                (train_images, train_labels, test_images, test_labels)
            }
        };

        // CI 控制台里多打一点形状信息，排查问题时省事
        println!("train_images.shape: {:?}", train_images.shape());
        println!("test_images.shape: {:?}", test_images.shape());

        ctx.ensure_training_data_dir()?;
        train_images.save(&ctx.train_images_path())?;
        train_labels.save(&ctx.train_labels_path())?;
        test_images.save(&ctx.test_images_path())?;
        test_labels.save(&ctx.test_labels_path())?;

        println!("数据已写入 {}", ctx.training_data_dir().display());
        Ok(())
    }
}

use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::Result;
use ml::{FashionDataset, ModelMeta, TrainConfig, training};

/// 阶段 2：训练。
///
/// 读取 build 阶段写出的训练数组，训练固定结构的 CNN，
/// 把模型导出到 `training_data/trained_model/`。
/// 不做验证集划分，也不做 checkpoint。
pub struct Train {
    pub config: TrainConfig,
}

impl Stage for Train {
    fn label(&self) -> &str {
        "train"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let (images, labels) = ctx.load_train()?;
        let dataset = FashionDataset::from_arrays(images, labels)?;

        let (height, width) = dataset.image_size();
        let meta = ModelMeta {
            height,
            width,
            channels: dataset.channels(),
            num_classes: dataset.num_classes(),
        };

        let model = training::train_new(&dataset, &self.config)?;
        println!("\n模型参数量：{}", training::num_params(&model));

        let export_dir = ctx.model_export_dir();
        ml::save_export(&export_dir, &training::to_inference(model), &meta)?;
        println!("模型已导出到 {}", export_dir.display());
        Ok(())
    }
}

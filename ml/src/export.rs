use crate::{
    model::FashionNet,
    training::{InferenceBackend, TrainBackend},
};
use anyhow::{Context, Result, ensure};
use burn::{
    module::Module,
    record::{DefaultFileRecorder, FullPrecisionSettings},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

/// 权重文件名（burn 记录格式，实际落盘为 model.mpk）。
const WEIGHTS_STEM: &str = "model";
/// 描述模型输入输出形状的元数据文件。
const META_FILE: &str = "model_meta.json";

/// 模型导出目录的元数据：重建网络结构所需的全部形状信息。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelMeta {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub num_classes: usize,
}

/// 将训练好的模型导出到目录：权重 + 元数据两个文件。
///
/// 目录整体就是阶段间交接的“模型工件”，打包阶段会原样递归上传。
pub fn save_export(dir: &Path, model: &FashionNet<InferenceBackend>, meta: &ModelMeta) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("无法创建导出目录 {}", dir.display()))?;

    let weights_path = dir.join(WEIGHTS_STEM);
    let recorder = DefaultFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(&weights_path, &recorder)
        .with_context(|| format!("保存模型权重失败：{}", weights_path.display()))?;

    let meta_path = dir.join(META_FILE);
    let file = File::create(&meta_path)
        .with_context(|| format!("无法创建元数据文件 {}", meta_path.display()))?;
    serde_json::to_writer_pretty(file, meta)
        .with_context(|| format!("写入元数据失败 {}", meta_path.display()))?;

    Ok(())
}

/// 读取导出目录的元数据。
pub fn load_meta(dir: &Path) -> Result<ModelMeta> {
    let meta_path = dir.join(META_FILE);
    let file = File::open(&meta_path)
        .with_context(|| format!("无法读取元数据文件 {}", meta_path.display()))?;
    let meta: ModelMeta = serde_json::from_reader(file)
        .with_context(|| format!("解析元数据失败 {}", meta_path.display()))?;
    ensure!(
        meta.num_classes > 0,
        "元数据中的类别数量无效：{}",
        meta.num_classes
    );
    Ok(meta)
}

/// 加载导出目录，得到推理后端的模型。
pub fn load_export(dir: &Path) -> Result<(FashionNet<InferenceBackend>, ModelMeta)> {
    let meta = load_meta(dir)?;
    let model = load_weights::<InferenceBackend>(dir, &meta)?;
    Ok((model, meta))
}

/// 加载导出目录，得到可以继续训练的自动求导模型（重训阶段使用）。
pub fn load_export_for_training(dir: &Path) -> Result<(FashionNet<TrainBackend>, ModelMeta)> {
    let meta = load_meta(dir)?;
    let model = load_weights::<TrainBackend>(dir, &meta)?;
    Ok((model, meta))
}

fn load_weights<B: Backend>(dir: &Path, meta: &ModelMeta) -> Result<FashionNet<B>> {
    let device = B::Device::default();
    let model = FashionNet::<B>::new(
        &device,
        meta.height,
        meta.width,
        meta.channels,
        meta.num_classes,
    );
    let weights_path = dir.join(WEIGHTS_STEM);
    let recorder = DefaultFileRecorder::<FullPrecisionSettings>::new();
    model
        .load_file(&weights_path, &recorder, &device)
        .with_context(|| format!("加载模型权重失败：{}", weights_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::backend::Backend;
    use tempfile::TempDir;

    #[test]
    fn export_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let device = <InferenceBackend as Backend>::Device::default();
        let meta = ModelMeta {
            height: 28,
            width: 28,
            channels: 1,
            num_classes: 10,
        };
        let model =
            FashionNet::<InferenceBackend>::new(&device, meta.height, meta.width, meta.channels, meta.num_classes);

        save_export(dir.path(), &model, &meta).unwrap();
        assert!(dir.path().join("model_meta.json").exists());

        let (_reloaded, loaded_meta) = load_export(dir.path()).unwrap();
        assert_eq!(loaded_meta.num_classes, 10);
        assert_eq!(loaded_meta.height, 28);

        let (_trainable, _) = load_export_for_training(dir.path()).unwrap();
    }

    #[test]
    fn load_export_fails_on_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(load_export(&dir.path().join("nope")).is_err());
    }
}

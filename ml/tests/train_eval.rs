//! 小型合成数据集上的端到端训练测试：
//! 确定性、可分数据上的收敛、以及模型导出后的评估一致性。

use ml::{FashionDataset, TrainConfig, dataset, training};
use tempfile::TempDir;

fn tiny_dataset(seed: u64) -> FashionDataset {
    let (images, labels) = dataset::synthetic(20, 2, seed).expect("synthetic dataset");
    FashionDataset::from_arrays(images, labels).expect("dataset invariants hold")
}

#[test]
fn training_learns_a_separable_pattern() {
    let dataset = tiny_dataset(7);
    let config = TrainConfig {
        epochs: 15,
        batch_size: 4,
        learning_rate: 1e-2,
        seed: 42,
    };

    let model = training::train_new(&dataset, &config).expect("training succeeds");
    let stats = training::evaluate(&model, &dataset, config.batch_size).expect("evaluation runs");

    // 竖直亮带是线性可分的模式，这个规模下应当几乎全部分对。
    assert!(
        stats.accuracy() >= 0.9,
        "可分数据上的训练准确率过低：{}",
        stats.accuracy()
    );
}

#[test]
fn training_is_deterministic_for_a_fixed_seed() {
    let config = TrainConfig {
        epochs: 2,
        batch_size: 4,
        learning_rate: 1e-2,
        seed: 42,
    };

    let first = {
        let dataset = tiny_dataset(7);
        let model = training::train_new(&dataset, &config).unwrap();
        training::evaluate(&model, &dataset, config.batch_size)
            .unwrap()
            .accuracy()
    };
    let second = {
        let dataset = tiny_dataset(7);
        let model = training::train_new(&dataset, &config).unwrap();
        training::evaluate(&model, &dataset, config.batch_size)
            .unwrap()
            .accuracy()
    };

    assert_eq!(first, second, "同一种子的两次训练结果应当一致");
}

#[test]
fn exported_model_evaluates_identically() {
    let dataset = tiny_dataset(3);
    let config = TrainConfig {
        epochs: 8,
        batch_size: 4,
        learning_rate: 1e-2,
        seed: 1,
    };

    let model = training::train_new(&dataset, &config).unwrap();
    let before = training::evaluate(&model, &dataset, config.batch_size)
        .unwrap()
        .accuracy();

    let (height, width) = dataset.image_size();
    let meta = ml::ModelMeta {
        height,
        width,
        channels: dataset.channels(),
        num_classes: dataset.num_classes(),
    };

    let dir = TempDir::new().unwrap();
    ml::save_export(dir.path(), &training::to_inference(model), &meta).unwrap();
    let (reloaded, _) = ml::load_export(dir.path()).unwrap();
    let after = training::evaluate(&reloaded, &dataset, config.batch_size)
        .unwrap()
        .accuracy();

    assert_eq!(before, after, "导出再加载不应改变模型行为");
}

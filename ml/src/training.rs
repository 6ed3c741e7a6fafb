use crate::{
    dataset::{FashionBatch, FashionDataset, FashionSample},
    model::FashionNet,
};
use anyhow::{Result, anyhow};
use burn::{
    backend::Autodiff,
    backend::ndarray::NdArray,
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::{AutodiffModule, Module},
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{ElementConversion, backend::Backend},
};
use std::io::{self, Write};
use std::sync::Arc;

/// 默认使用 CPU（NdArray）后端：CI 机器不保证有 GPU，结果也更容易复现。
pub type InferenceBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferenceBackend>;

/// 训练时的超参数。
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// epoch 数。
    pub epochs: usize,
    /// batch 大小。
    pub batch_size: usize,
    /// Adam 优化器的学习率。
    pub learning_rate: f64,
    /// 随机种子，控制参数初始化与 shuffle。
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

/// 一轮遍历的累计指标。
#[derive(Default)]
pub struct TrainStats {
    loss_sum: f32,
    batches: usize,
    examples: usize,
    correct: usize,
}

impl TrainStats {
    fn record_loss(&mut self, loss: f32) {
        self.loss_sum += loss;
        self.batches += 1;
    }

    fn record_accuracy(&mut self, preds: &[i32], targets: &[i32]) {
        self.examples += targets.len();
        self.correct += preds
            .iter()
            .zip(targets.iter())
            .filter(|(pred, target)| pred == target)
            .count();
    }

    pub fn avg_loss(&self) -> f32 {
        if self.batches == 0 {
            0.0
        } else {
            self.loss_sum / self.batches as f32
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.examples == 0 {
            0.0
        } else {
            self.correct as f32 / self.examples as f32
        }
    }
}

/// 从零初始化模型并训练。
pub fn train_new(dataset: &FashionDataset, config: &TrainConfig) -> Result<FashionNet<TrainBackend>> {
    let device = <TrainBackend as Backend>::Device::default();
    TrainBackend::seed(config.seed);

    let (height, width) = dataset.image_size();
    let model = FashionNet::<TrainBackend>::new(
        &device,
        height,
        width,
        dataset.channels(),
        dataset.num_classes(),
    );
    fit(model, dataset, config)
}

/// 主训练循环：Adam + 交叉熵（logits 输入），每轮打印损失与准确率。
pub fn fit(
    mut model: FashionNet<TrainBackend>,
    dataset: &FashionDataset,
    config: &TrainConfig,
) -> Result<FashionNet<TrainBackend>> {
    if dataset.is_empty() {
        anyhow::bail!("训练集为空，请检查 build 阶段的输出");
    }

    let device = <TrainBackend as Backend>::Device::default();
    let (height, width) = dataset.image_size();

    println!(
        "准备训练：样本 {}，类别数 {}，输入尺寸 {}x{}x{}",
        dataset.len(),
        dataset.num_classes(),
        height,
        width,
        dataset.channels()
    );

    let loader = build_loader::<TrainBackend>(
        dataset,
        config.batch_size,
        Some(config.seed),
        device.clone(),
    );
    let loss_fn = CrossEntropyLossConfig::new().init(&device);
    let mut optimizer = AdamConfig::new().init();
    let total_items = loader.num_items();

    for epoch in 0..config.epochs {
        let mut stats = TrainStats::default();
        let mut loader_iter = loader.iter();
        let mut processed = 0usize;

        println!(
            "\n开始第 {}/{} 轮训练（批量大小 {}）",
            epoch + 1,
            config.epochs,
            config.batch_size
        );

        while let Some(batch) = loader_iter.next() {
            let logits = model.forward(batch.images.clone());
            let loss = loss_fn.forward(logits.clone(), batch.targets.clone());
            let loss_value = loss.clone().into_scalar();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            stats.record_loss(loss_value);
            processed += batch.targets.dims()[0];
            print!(
                "\r  训练进度 {:>6}/{:<6} 样本 | 当前批次损失 {:.4}",
                processed, total_items, loss_value
            );
            let _ = io::stdout().flush();
        }
        println!();

        println!(
            "epoch {:>3}/{:<3} | train_loss: {:.4}",
            epoch + 1,
            config.epochs,
            stats.avg_loss()
        );
    }

    Ok(model)
}

/// 在给定数据集上评估模型，返回平均损失与准确率。
pub fn evaluate<B: Backend>(
    model: &FashionNet<B>,
    dataset: &FashionDataset,
    batch_size: usize,
) -> Result<TrainStats> {
    let device = B::Device::default();
    let loader = build_loader::<B>(dataset, batch_size, None, device.clone());
    let loss_fn = CrossEntropyLossConfig::new().init(&device);
    eval_with_loader(model, &loss_fn, &loader)
}

/// 去掉自动求导包装，得到用于保存与部署的推理模型。
pub fn to_inference(model: FashionNet<TrainBackend>) -> FashionNet<InferenceBackend> {
    model.valid()
}

fn build_loader<B: Backend>(
    dataset: &FashionDataset,
    batch_size: usize,
    shuffle_seed: Option<u64>,
    device: B::Device,
) -> Arc<dyn DataLoader<B, FashionBatch<B>>> {
    let batcher = dataset.batcher::<B>();
    let builder = DataLoaderBuilder::<B, FashionSample, FashionBatch<B>>::new(batcher)
        .batch_size(batch_size)
        .set_device(device);

    let builder = if let Some(seed) = shuffle_seed {
        builder.shuffle(seed)
    } else {
        builder
    };

    builder.build(dataset.clone())
}

fn eval_with_loader<B: Backend>(
    model: &FashionNet<B>,
    loss_fn: &CrossEntropyLoss<B>,
    loader: &Arc<dyn DataLoader<B, FashionBatch<B>>>,
) -> Result<TrainStats> {
    let mut stats = TrainStats::default();
    let mut iter = loader.iter();

    while let Some(batch) = iter.next() {
        let logits = model.forward(batch.images.clone());
        let loss = loss_fn.forward(logits.clone(), batch.targets.clone());
        stats.record_loss(loss.into_scalar().elem::<f32>());

        // 不同后端的整型元素类型不一致，先统一转换成 i32 再读取。
        let preds = logits
            .argmax(1)
            .into_data()
            .convert::<i32>()
            .into_vec::<i32>()
            .map_err(|err| anyhow!("读取预测张量失败：{err:?}"))?;
        let targets = batch
            .targets
            .clone()
            .into_data()
            .convert::<i32>()
            .into_vec::<i32>()
            .map_err(|err| anyhow!("读取标签张量失败：{err:?}"))?;
        stats.record_accuracy(&preds, &targets);
    }

    Ok(stats)
}

/// 模型参数量，train 阶段打印摘要时使用。
pub fn num_params<B: Backend>(model: &FashionNet<B>) -> usize {
    model.num_params()
}

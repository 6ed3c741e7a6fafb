use burn::{
    module::Module,
    nn::{Linear, LinearConfig, conv::Conv2d, conv::Conv2dConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};

/// 最简单的 CNN 分类器：一层卷积 + 展平 + 一层全连接输出 logits。
///
/// 流水线关注的是各阶段的衔接而不是建模本身，所以网络结构固定，
/// 与输入尺寸相关的维度在 `new` 中按卷积输出推算。
#[derive(Module, Debug)]
pub struct FashionNet<B: Backend> {
    conv: Conv2d<B>,
    fc: Linear<B>,
}

/// 卷积核尺寸与步长固定，输出通道数固定为 8。
const FILTERS: usize = 8;
const KERNEL: usize = 3;
const STRIDE: usize = 2;

impl<B: Backend> FashionNet<B> {
    /// 创建网络。
    ///
    /// # 参数
    /// - `device`: 设备（NdArray 后端即 CPU）。
    /// - `height` / `width`: 输入图像尺寸。
    /// - `channels`: 输入通道数（灰度图为 1）。
    /// - `num_classes`: 类别数量。
    pub fn new(
        device: &B::Device,
        height: usize,
        width: usize,
        channels: usize,
        num_classes: usize,
    ) -> Self {
        assert!(
            height > KERNEL && width > KERNEL,
            "输入尺寸至少需要大于卷积核 {}x{}，当前为 {}x{}",
            KERNEL,
            KERNEL,
            height,
            width
        );

        let conv = Conv2dConfig::new([channels, FILTERS], [KERNEL, KERNEL])
            .with_stride([STRIDE, STRIDE])
            .init(device);

        // valid padding 下的卷积输出尺寸
        let out_height = (height - KERNEL) / STRIDE + 1;
        let out_width = (width - KERNEL) / STRIDE + 1;
        let flattened = FILTERS * out_height * out_width;

        let fc = LinearConfig::new(flattened, num_classes).init(device);

        Self { conv, fc }
    }

    /// 前向推理，返回每个类别的 logits。
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv.forward(input));
        let x = x.flatten(1, 3);
        self.fc.forward(x)
    }
}

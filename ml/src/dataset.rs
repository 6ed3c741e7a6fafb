use crate::artifacts::{ImageSet, LabelSet};
use anyhow::{Context, Result, anyhow, ensure};
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    tensor::{Int, Tensor, TensorData, backend::Backend},
};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::fs;
use std::sync::Arc;

/// Fashion-MNIST 的十个类别名称，顺序与标签编号一致。
pub const CLASS_NAMES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

const IDX_IMAGES_MAGIC: u32 = 2051;
const IDX_LABELS_MAGIC: u32 = 2049;

/// 单个样本，供 `Batcher` 组装成张量。
#[derive(Clone, Debug)]
pub struct FashionSample {
    pub pixels: Vec<f32>,
    pub label: usize,
}

/// 批数据，包含图像与标签张量。
#[derive(Clone, Debug)]
pub struct FashionBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub targets: Tensor<B, 1, Int>,
}

/// 内存中的数据集：持有一个 split 的图像与标签数组。
#[derive(Clone)]
pub struct FashionDataset {
    images: Arc<ImageSet>,
    labels: Arc<LabelSet>,
    num_classes: usize,
}

impl FashionDataset {
    /// 由已加载的数组构造数据集，同时校验 split 不变量。
    pub fn from_arrays(images: ImageSet, labels: LabelSet) -> Result<Self> {
        images.validate()?;
        ensure!(
            images.count == labels.len(),
            "图像数量 {} 与标签数量 {} 不一致",
            images.count,
            labels.len()
        );
        ensure!(!labels.is_empty(), "数据集为空，请先运行 build 阶段");
        ensure!(
            images.channels == 1,
            "流水线只处理单通道灰度图，当前通道数为 {}",
            images.channels
        );

        let num_classes = labels.num_classes();
        Ok(Self {
            images: Arc::new(images),
            labels: Arc::new(labels),
            num_classes,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 返回类别数量（按标签最大值推断）。
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// 返回 (高, 宽)。
    pub fn image_size(&self) -> (usize, usize) {
        (self.images.height, self.images.width)
    }

    pub fn channels(&self) -> usize {
        self.images.channels
    }

    /// 创建一个批处理器，供 DataLoader 组装批次。
    pub fn batcher<B: Backend>(&self) -> FashionBatcher<B> {
        FashionBatcher::new(self.images.height, self.images.width, self.images.channels)
    }
}

impl Dataset<FashionSample> for FashionDataset {
    fn get(&self, index: usize) -> Option<FashionSample> {
        if index >= self.labels.len() {
            return None;
        }
        Some(FashionSample {
            pixels: self.images.image(index).to_vec(),
            label: self.labels.labels[index] as usize,
        })
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}

/// 将单个样本堆叠成批处理张量。
#[derive(Clone)]
pub struct FashionBatcher<B: Backend> {
    height: usize,
    width: usize,
    channels: usize,
    _marker: std::marker::PhantomData<B>,
}

impl<B: Backend> FashionBatcher<B> {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, FashionSample, FashionBatch<B>> for FashionBatcher<B> {
    fn batch(&self, items: Vec<FashionSample>, device: &B::Device) -> FashionBatch<B> {
        let batch_size = items.len();
        let spatial = self.height * self.width;
        // 单通道下 (H, W, 1) 与 (1, H, W) 的内存布局一致，像素可以直接拷贝。
        let mut pixels = Vec::with_capacity(batch_size * self.channels * spatial);
        let mut labels: Vec<i32> = Vec::with_capacity(batch_size);

        for sample in items {
            pixels.extend_from_slice(&sample.pixels);
            labels.push(sample.label as i32);
        }

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, self.channels, self.height, self.width]),
            device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [batch_size]), device);

        FashionBatch { images, targets }
    }
}

/// 从数据目录加载 Fashion-MNIST 的四个 IDX 文件（支持 .gz 压缩）。
///
/// 返回 (训练图像, 训练标签, 测试图像, 测试标签)，像素已归一化到 `[0, 1]`。
pub fn load_fashion_dir(dir: &Path) -> Result<(ImageSet, LabelSet, ImageSet, LabelSet)> {
    let train_images = load_idx_images(&locate_idx(dir, "train-images-idx3-ubyte")?)?;
    let train_labels = load_idx_labels(&locate_idx(dir, "train-labels-idx1-ubyte")?)?;
    let test_images = load_idx_images(&locate_idx(dir, "t10k-images-idx3-ubyte")?)?;
    let test_labels = load_idx_labels(&locate_idx(dir, "t10k-labels-idx1-ubyte")?)?;
    Ok((train_images, train_labels, test_images, test_labels))
}

fn locate_idx(dir: &Path, base: &str) -> Result<PathBuf> {
    let plain = dir.join(base);
    if plain.exists() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{base}.gz"));
    if gz.exists() {
        return Ok(gz);
    }
    Err(anyhow!(
        "数据目录 {} 中找不到 {}（或 {base}.gz）",
        dir.display(),
        base
    ))
}

/// 读取 IDX 文件内容，按文件头自动解压 gzip。
fn read_idx_bytes(path: &Path) -> Result<Vec<u8>> {
    let raw =
        fs::read(path).with_context(|| format!("无法读取数据文件 {}", path.display()))?;
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut decoded = Vec::new();
        GzDecoder::new(Cursor::new(raw))
            .read_to_end(&mut decoded)
            .with_context(|| format!("解压数据文件失败 {}", path.display()))?;
        Ok(decoded)
    } else {
        Ok(raw)
    }
}

/// 解析 IDX 图像文件：大端 magic 2051、数量、行、列，随后是原始像素。
pub fn load_idx_images(path: &Path) -> Result<ImageSet> {
    let bytes = read_idx_bytes(path)?;
    let mut cursor = Cursor::new(&bytes);
    let magic = cursor.read_u32::<BigEndian>().context("读取 IDX 文件头失败")?;
    ensure!(
        magic == IDX_IMAGES_MAGIC,
        "{} 不是 IDX 图像文件（magic = {magic}）",
        path.display()
    );
    let count = cursor.read_u32::<BigEndian>()? as usize;
    let rows = cursor.read_u32::<BigEndian>()? as usize;
    let cols = cursor.read_u32::<BigEndian>()? as usize;

    let offset = cursor.position() as usize;
    let raw = &bytes[offset..];
    ImageSet::from_raw(count, rows, cols, 1, raw)
        .with_context(|| format!("IDX 图像文件内容不完整 {}", path.display()))
}

/// 解析 IDX 标签文件：大端 magic 2049、数量，随后是标签字节。
pub fn load_idx_labels(path: &Path) -> Result<LabelSet> {
    let bytes = read_idx_bytes(path)?;
    let mut cursor = Cursor::new(&bytes);
    let magic = cursor.read_u32::<BigEndian>().context("读取 IDX 文件头失败")?;
    ensure!(
        magic == IDX_LABELS_MAGIC,
        "{} 不是 IDX 标签文件（magic = {magic}）",
        path.display()
    );
    let count = cursor.read_u32::<BigEndian>()? as usize;
    let offset = cursor.position() as usize;
    let raw = &bytes[offset..];
    ensure!(
        raw.len() == count,
        "标签数量 {} 与文件头声明的 {count} 不符",
        raw.len()
    );
    Ok(LabelSet::new(raw.to_vec()))
}

/// 生成确定性的合成数据集，用于本地演示与测试。
///
/// 每个类别在图像上占据一条竖直亮带，带内像素亮、带外像素暗，
/// 加入少量由种子控制的噪声，类别之间线性可分。
pub fn synthetic(count: usize, num_classes: usize, seed: u64) -> Result<(ImageSet, LabelSet)> {
    ensure!(count > 0, "样本数量必须大于 0");
    ensure!(
        (1..=255).contains(&num_classes),
        "类别数量必须在 1..=255 之间，当前为 {num_classes}"
    );

    let height = 28usize;
    let width = 28usize;
    let band = width / num_classes.min(width);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut raw = Vec::with_capacity(count * height * width);
    let mut labels = Vec::with_capacity(count);

    for i in 0..count {
        let class = i % num_classes;
        let band_start = class * band;
        let band_end = if class + 1 == num_classes {
            width
        } else {
            band_start + band
        };
        for _y in 0..height {
            for x in 0..width {
                let value: u8 = if (band_start..band_end).contains(&x) {
                    rng.random_range(200..=255)
                } else {
                    rng.random_range(0..=40)
                };
                raw.push(value);
            }
        }
        labels.push(class as u8);
    }

    let images = ImageSet::from_raw(count, height, width, 1, &raw)?;
    Ok((images, LabelSet::new(labels)))
}

/// 模拟“拿到一批坏数据”：把图像顺序和标签顺序各自独立打乱，
/// 使两者不再对应。重训阶段用它来演示回归保护。
pub fn decorrelate(images: &mut ImageSet, labels: &mut LabelSet, seed: u64) {
    let image_len = images.image_len();
    let mut order: Vec<usize> = (0..images.count).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut shuffled = Vec::with_capacity(images.pixels.len());
    for &idx in &order {
        shuffled.extend_from_slice(&images.pixels[idx * image_len..(idx + 1) * image_len]);
    }
    images.pixels = shuffled;

    // 标签用不同的种子打乱，保证与图像的排列互相独立。
    let mut label_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    labels.labels.shuffle(&mut label_rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_idx_images(raw: &[u8], count: u32, rows: u32, cols: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(IDX_IMAGES_MAGIC).unwrap();
        bytes.write_u32::<BigEndian>(count).unwrap();
        bytes.write_u32::<BigEndian>(rows).unwrap();
        bytes.write_u32::<BigEndian>(cols).unwrap();
        bytes.extend_from_slice(raw);
        bytes
    }

    #[test]
    fn synthetic_produces_normalized_nhwc_arrays() {
        let (images, labels) = synthetic(20, 2, 7).unwrap();
        assert_eq!(images.shape(), (20, 28, 28, 1));
        assert_eq!(labels.len(), 20);
        assert!(images.pixels.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(labels.num_classes(), 2);
    }

    #[test]
    fn synthetic_is_deterministic_for_a_seed() {
        let (a, _) = synthetic(8, 2, 42).unwrap();
        let (b, _) = synthetic(8, 2, 42).unwrap();
        assert_eq!(a.pixels, b.pixels);
        let (c, _) = synthetic(8, 2, 43).unwrap();
        assert_ne!(a.pixels, c.pixels);
    }

    #[test]
    fn decorrelate_permutes_but_preserves_content() {
        let (mut images, mut labels) = synthetic(12, 3, 1).unwrap();
        let original_labels = labels.labels.clone();
        let original_pixel_count = images.pixels.len();

        decorrelate(&mut images, &mut labels, 99);

        assert_eq!(images.pixels.len(), original_pixel_count);
        let mut sorted_before = original_labels.clone();
        let mut sorted_after = labels.labels.clone();
        sorted_before.sort_unstable();
        sorted_after.sort_unstable();
        assert_eq!(sorted_before, sorted_after);
        images.validate().unwrap();
    }

    #[test]
    fn idx_images_parse_from_plain_and_gzip_files() {
        let dir = TempDir::new().unwrap();
        let raw: Vec<u8> = (0..2 * 4 * 4).map(|i| i as u8).collect();
        let encoded = write_idx_images(&raw, 2, 4, 4);

        let plain = dir.path().join("images-idx3-ubyte");
        std::fs::write(&plain, &encoded).unwrap();
        let set = load_idx_images(&plain).unwrap();
        assert_eq!(set.shape(), (2, 4, 4, 1));

        let gz_path = dir.path().join("images-idx3-ubyte.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded).unwrap();
        std::fs::write(&gz_path, encoder.finish().unwrap()).unwrap();
        let from_gz = load_idx_images(&gz_path).unwrap();
        assert_eq!(from_gz.pixels, set.pixels);
    }

    #[test]
    fn idx_labels_reject_truncated_payload() {
        let dir = TempDir::new().unwrap();
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(IDX_LABELS_MAGIC).unwrap();
        bytes.write_u32::<BigEndian>(10).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        let path = dir.path().join("labels-idx1-ubyte");
        std::fs::write(&path, &bytes).unwrap();
        assert!(load_idx_labels(&path).is_err());
    }

    #[test]
    fn dataset_enforces_count_invariant() {
        let (images, _) = synthetic(6, 2, 5).unwrap();
        let labels = LabelSet::new(vec![0, 1]);
        assert!(FashionDataset::from_arrays(images, labels).is_err());
    }

    #[test]
    fn dataset_yields_samples_with_matching_labels() {
        let (images, labels) = synthetic(6, 2, 5).unwrap();
        let expected = labels.labels.clone();
        let dataset = FashionDataset::from_arrays(images, labels).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.num_classes(), 2);
        for (idx, label) in expected.iter().enumerate() {
            let sample = Dataset::get(&dataset, idx).unwrap();
            assert_eq!(sample.label, *label as usize);
            assert_eq!(sample.pixels.len(), 28 * 28);
        }
    }
}

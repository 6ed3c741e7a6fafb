use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// 一组图像数组：形状固定为 (N, H, W, C)，像素已归一化到 `[0, 1]`。
///
/// 各阶段之间通过磁盘上的序列化文件交接，这里就是交接格式本身，
/// 加载时会校验长度与像素范围，损坏的文件直接让当前阶段失败。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageSet {
    pub count: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub pixels: Vec<f32>,
}

impl ImageSet {
    /// 由原始 0-255 字节构造，并缩放到 `[0, 1]`。
    pub fn from_raw(count: usize, height: usize, width: usize, channels: usize, raw: &[u8]) -> Result<Self> {
        ensure!(
            raw.len() == count * height * width * channels,
            "原始像素数量 {} 与形状 ({}, {}, {}, {}) 不符",
            raw.len(),
            count,
            height,
            width,
            channels
        );
        let pixels = raw.iter().map(|&b| b as f32 / 255.0).collect();
        Ok(Self {
            count,
            height,
            width,
            channels,
            pixels,
        })
    }

    /// 返回 (N, H, W, C)。
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.count, self.height, self.width, self.channels)
    }

    /// 单张图像占用的像素数。
    pub fn image_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// 第 `index` 张图像的像素切片。
    pub fn image(&self, index: usize) -> &[f32] {
        let len = self.image_len();
        &self.pixels[index * len..(index + 1) * len]
    }

    /// 第 `index` 张图像按 (H, W, C) 展开成嵌套数组，供 JSON 推理请求使用。
    pub fn image_nested(&self, index: usize) -> Vec<Vec<Vec<f32>>> {
        let image = self.image(index);
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        let base = (y * self.width + x) * self.channels;
                        image[base..base + self.channels].to_vec()
                    })
                    .collect()
            })
            .collect()
    }

    /// 校验结构不变量：长度匹配、像素落在 `[0, 1]`。
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pixels.len() == self.count * self.image_len(),
            "像素数量 {} 与形状 ({}, {}, {}, {}) 不符",
            self.pixels.len(),
            self.count,
            self.height,
            self.width,
            self.channels
        );
        ensure!(
            self.pixels.iter().all(|p| (0.0..=1.0).contains(p)),
            "像素值超出 [0, 1] 区间，数据未正确归一化"
        );
        Ok(())
    }

    /// 序列化写入磁盘。
    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("无法创建图像文件 {}", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .with_context(|| format!("写入图像文件失败 {}", path.display()))
    }

    /// 从磁盘加载并校验。
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("无法打开图像文件 {}", path.display()))?;
        let set: Self = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("解析图像文件失败 {}", path.display()))?;
        set.validate()
            .with_context(|| format!("图像文件校验失败 {}", path.display()))?;
        Ok(set)
    }
}

/// 标签数组：与同一 split 的图像一一对应的类别编号。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelSet {
    pub labels: Vec<u8>,
}

impl LabelSet {
    pub fn new(labels: Vec<u8>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 按最大标签推断类别数量。
    pub fn num_classes(&self) -> usize {
        self.labels.iter().copied().max().map_or(0, |m| m as usize + 1)
    }

    /// 序列化写入磁盘。
    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("无法创建标签文件 {}", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .with_context(|| format!("写入标签文件失败 {}", path.display()))
    }

    /// 从磁盘加载。
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("无法打开标签文件 {}", path.display()))?;
        bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("解析标签文件失败 {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_raw_scales_to_unit_interval() {
        let raw = vec![0u8, 128, 255, 64];
        let set = ImageSet::from_raw(1, 2, 2, 1, &raw).unwrap();
        assert_eq!(set.shape(), (1, 2, 2, 1));
        assert!(set.pixels.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(set.pixels[2], 1.0);
        set.validate().unwrap();
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(ImageSet::from_raw(2, 2, 2, 1, &[0u8; 7]).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_pixels() {
        let mut set = ImageSet::from_raw(1, 2, 2, 1, &[10u8; 4]).unwrap();
        set.pixels[0] = 1.5;
        assert!(set.validate().is_err());
    }

    #[test]
    fn image_set_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.bin");
        let set = ImageSet::from_raw(2, 2, 2, 1, &[7u8; 8]).unwrap();
        set.save(&path).unwrap();
        let loaded = ImageSet::load(&path).unwrap();
        assert_eq!(loaded.shape(), set.shape());
        assert_eq!(loaded.pixels, set.pixels);
    }

    #[test]
    fn label_set_round_trips_and_counts_classes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.bin");
        let labels = LabelSet::new(vec![0, 3, 1, 3]);
        assert_eq!(labels.num_classes(), 4);
        labels.save(&path).unwrap();
        assert_eq!(LabelSet::load(&path).unwrap().labels, labels.labels);
    }

    #[test]
    fn image_nested_matches_flat_layout() {
        let set = ImageSet::from_raw(1, 2, 3, 1, &[0, 51, 102, 153, 204, 255]).unwrap();
        let nested = set.image_nested(0);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].len(), 3);
        assert_eq!(nested[0][0], vec![0.0]);
        assert_eq!(nested[1][2], vec![1.0]);
    }
}

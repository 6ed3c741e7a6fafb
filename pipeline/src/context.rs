use anyhow::{Context, Result, ensure};
use ml::{ImageSet, LabelSet};
use std::fs;
use std::path::{Path, PathBuf};

/// 阶段运行上下文：集中定义所有工件的磁盘位置。
///
/// 各阶段只通过这里的路径读写工件，交接契约因此集中在一个地方：
/// - `training_data/` 下的四个数组文件与模型导出目录；
/// - 仓库根目录下的 `model_version.txt`（版本号由外部管理）。
pub struct StageCtx {
    root: PathBuf,
}

impl StageCtx {
    /// `root` 为仓库（或工作目录）根，`training_data/` 在其下。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn training_data_dir(&self) -> PathBuf {
        self.root.join("training_data")
    }

    pub fn train_images_path(&self) -> PathBuf {
        self.training_data_dir().join("train_images.bin")
    }

    pub fn train_labels_path(&self) -> PathBuf {
        self.training_data_dir().join("train_labels.bin")
    }

    pub fn test_images_path(&self) -> PathBuf {
        self.training_data_dir().join("test_images.bin")
    }

    pub fn test_labels_path(&self) -> PathBuf {
        self.training_data_dir().join("test_labels.bin")
    }

    /// 训练好的模型导出目录（权重 + 元数据）。
    pub fn model_export_dir(&self) -> PathBuf {
        self.training_data_dir().join("trained_model")
    }

    pub fn version_path(&self) -> PathBuf {
        self.root.join("model_version.txt")
    }

    /// 确保 `training_data/` 存在，build 阶段写出前调用。
    pub fn ensure_training_data_dir(&self) -> Result<PathBuf> {
        let dir = self.training_data_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("无法创建数据目录 {}", dir.display()))?;
        Ok(dir)
    }

    /// 加载训练 split 的图像与标签。
    pub fn load_train(&self) -> Result<(ImageSet, LabelSet)> {
        load_split(&self.train_images_path(), &self.train_labels_path())
    }

    /// 加载测试 split 的图像与标签。
    pub fn load_test(&self) -> Result<(ImageSet, LabelSet)> {
        load_split(&self.test_images_path(), &self.test_labels_path())
    }

    /// 读取版本号：单行整数字符串，只去掉行尾换行，不做其它归一化。
    pub fn read_version(&self) -> Result<String> {
        let path = self.version_path();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("无法读取版本文件 {}", path.display()))?;
        let version = trim_trailing_newline(&content).to_string();
        ensure!(!version.is_empty(), "版本文件 {} 为空", path.display());
        Ok(version)
    }
}

fn load_split(images_path: &Path, labels_path: &Path) -> Result<(ImageSet, LabelSet)> {
    let images = ImageSet::load(images_path)?;
    let labels = LabelSet::load(labels_path)?;
    ensure!(
        images.count == labels.len(),
        "图像数量 {} 与标签数量 {} 不一致（{} / {}）",
        images.count,
        labels.len(),
        images_path.display(),
        labels_path.display()
    );
    Ok((images, labels))
}

/// 只去掉一个行尾换行（`\n` 或 `\r\n`），其余字符原样保留。
fn trim_trailing_newline(s: &str) -> &str {
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.strip_suffix('\r').unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_only_the_trailing_newline() {
        assert_eq!(trim_trailing_newline("3\n"), "3");
        assert_eq!(trim_trailing_newline("3\r\n"), "3");
        assert_eq!(trim_trailing_newline("3"), "3");
        // 行内与行首的空白保留，版本号不做归一化
        assert_eq!(trim_trailing_newline(" 3\n"), " 3");
        assert_eq!(trim_trailing_newline("3 \n"), "3 ");
    }

    #[test]
    fn artifact_paths_live_under_training_data() {
        let ctx = StageCtx::new("/work");
        assert_eq!(
            ctx.train_images_path(),
            PathBuf::from("/work/training_data/train_images.bin")
        );
        assert_eq!(
            ctx.model_export_dir(),
            PathBuf::from("/work/training_data/trained_model")
        );
        assert_eq!(ctx.version_path(), PathBuf::from("/work/model_version.txt"));
    }

    #[test]
    fn read_version_trims_newline_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("model_version.txt"), "7\n").unwrap();
        let ctx = StageCtx::new(dir.path());
        assert_eq!(ctx.read_version().unwrap(), "7");
    }

    #[test]
    fn read_version_rejects_an_empty_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("model_version.txt"), "\n").unwrap();
        let ctx = StageCtx::new(dir.path());
        assert!(ctx.read_version().is_err());
    }
}

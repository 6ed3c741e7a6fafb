use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::{Result, ensure};
use ml::{FashionDataset, load_export, training};

/// 阶段 3：评估，流水线里唯一的质量门。
///
/// 在测试集上计算准确率，低于阈值就让本阶段失败；
/// 恰好等于阈值算通过。
pub struct Evaluate {
    pub min_accuracy: f32,
    pub batch_size: usize,
}

impl Stage for Evaluate {
    fn label(&self) -> &str {
        "evaluate"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let (images, labels) = ctx.load_test()?;
        let dataset = FashionDataset::from_arrays(images, labels)?;
        let (model, _meta) = load_export(&ctx.model_export_dir())?;

        let stats = training::evaluate(&model, &dataset, self.batch_size)?;
        println!(
            "测试集准确率：{:.4}（损失 {:.4}）",
            stats.accuracy(),
            stats.avg_loss()
        );

        ensure!(
            meets_threshold(stats.accuracy(), self.min_accuracy),
            "测试未通过：准确率 {:.4} 低于阈值 {:.4}",
            stats.accuracy(),
            self.min_accuracy
        );
        Ok(())
    }
}

/// 质量门判定：达到阈值即通过。
fn meets_threshold(accuracy: f32, min_accuracy: f32) -> bool {
    accuracy >= min_accuracy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundary_passes_at_exactly_the_minimum() {
        assert!(!meets_threshold(0.79999, 0.8));
        assert!(meets_threshold(0.8, 0.8));
        assert!(meets_threshold(0.80001, 0.8));
    }
}

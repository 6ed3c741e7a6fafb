use crate::context::StageCtx;
use crate::stage::Stage;
use anyhow::{Result, ensure};
use ml::CLASS_NAMES;
use serving::{PredictClient, argmax};

/// 阶段 7：线上冒烟测试。
///
/// 把测试集的前几张图像发给生产环境的推理端点，打印第一个样本的
/// 预测类别与真实类别。只验证请求链路通畅，不做断言——
/// 模型质量在 evaluate 阶段已经把过关。
pub struct TestDeployed {
    pub hostname: String,
    pub port: u16,
    pub model_name: String,
    /// 发送的样本数量。
    pub count: usize,
}

impl Stage for TestDeployed {
    fn label(&self) -> &str {
        "test-deployed"
    }

    fn run(&self, ctx: &StageCtx) -> Result<()> {
        let (images, labels) = ctx.load_test()?;
        let count = self.count.min(images.count);
        ensure!(count > 0, "测试集为空，无法发送推理请求");

        let instances: Vec<_> = (0..count).map(|i| images.image_nested(i)).collect();
        let client = PredictClient::new(&self.hostname, self.port, &self.model_name)?;
        println!("请求 {}（{} 个样本）", client.endpoint(), count);

        let response = client.predict(instances)?;
        ensure!(
            !response.predictions.is_empty(),
            "推理端点返回了空的 predictions 数组"
        );

        let predicted = argmax(&response.predictions[0]);
        let actual = labels.labels[0] as usize;
        println!(
            "模型认为这是 {}（类别 {}），实际是 {}（类别 {}）",
            class_name(predicted),
            predicted,
            class_name(actual),
            actual
        );
        Ok(())
    }
}

fn class_name(index: usize) -> String {
    CLASS_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("<unknown #{index}>"))
}

use crate::context::StageCtx;
use anyhow::Result;
use std::time::Instant;

/// 所有流水线阶段的统一接口。
///
/// 每个阶段实现 `run`：读取上下文中约定的工件路径，完成一件事，
/// 把输出写回约定位置。
/// - 阶段不应捕获致命错误（如工件缺失、远程传输失败），应向上传递；
/// - 质量门（准确率阈值、重训回归）在阶段内部显式判定并返回错误。
pub trait Stage {
    /// 返回阶段名称，打印在 CI 控制台里。
    fn label(&self) -> &str;

    /// 执行阶段。
    fn run(&self, ctx: &StageCtx) -> Result<()>;
}

/// 运行一个阶段并打印耗时，错误原样向上传递（进程随之以非零码退出）。
pub fn run_stage(stage: &dyn Stage, ctx: &StageCtx) -> Result<()> {
    println!("[stage] {}", stage.label());
    let start = Instant::now();
    stage.run(ctx)?;
    println!("[stage] {} 完成，耗时 {:?}", stage.label(), start.elapsed());
    Ok(())
}

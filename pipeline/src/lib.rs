//! 流水线的各个阶段：每个阶段是一个独立进程，由外部 CI 编排器按顺序调用，
//! 阶段之间只通过 `training_data/` 下的序列化文件和 `model_version.txt` 交接。
//! 任何阶段失败都以非零退出码结束，这是编排器消费的唯一信号。

mod context;
mod stage;
pub mod stages;

pub use context::StageCtx;
pub use stage::{Stage, run_stage};

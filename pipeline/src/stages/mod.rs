//! 七个阶段的具体实现，与 CI 编排器中的作业一一对应。

pub mod build;
pub mod deploy;
pub mod evaluate;
pub mod package;
pub mod retrain;
pub mod smoke;
pub mod train;

pub use build::{Build, DataSource};
pub use deploy::Deploy;
pub use evaluate::Evaluate;
pub use package::Package;
pub use retrain::Retrain;
pub use smoke::TestDeployed;
pub use train::Train;

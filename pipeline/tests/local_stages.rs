//! 不需要远程主机的三个阶段（build / train / evaluate）串联测试：
//! 验证工件交接契约与质量门行为。

use ml::{ImageSet, TrainConfig};
use pipeline::stages::{Build, DataSource, Evaluate, Train};
use pipeline::{Stage, StageCtx};
use tempfile::TempDir;

fn synthetic_build(ctx: &StageCtx) {
    let build = Build {
        source: DataSource::Synthetic {
            samples: 40,
            classes: 2,
            seed: 7,
        },
    };
    build.run(ctx).expect("build stage writes artifacts");
}

#[test]
fn build_writes_all_four_artifacts() {
    let dir = TempDir::new().unwrap();
    let ctx = StageCtx::new(dir.path());
    synthetic_build(&ctx);

    for path in [
        ctx.train_images_path(),
        ctx.train_labels_path(),
        ctx.test_images_path(),
        ctx.test_labels_path(),
    ] {
        assert!(path.exists(), "缺少工件 {}", path.display());
    }

    // 交接格式可以直接加载并通过校验
    let images = ImageSet::load(&ctx.train_images_path()).unwrap();
    assert_eq!(images.shape(), (40, 28, 28, 1));
    assert!(images.pixels.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn train_then_evaluate_passes_a_reachable_gate_and_fails_an_unreachable_one() {
    let dir = TempDir::new().unwrap();
    let ctx = StageCtx::new(dir.path());
    synthetic_build(&ctx);

    let train = Train {
        config: TrainConfig {
            epochs: 10,
            batch_size: 8,
            learning_rate: 1e-2,
            seed: 42,
        },
    };
    train.run(&ctx).expect("train stage exports a model");
    assert!(ctx.model_export_dir().join("model_meta.json").exists());

    // 可分的合成数据上，宽松的阈值应当通过
    let lenient = Evaluate {
        min_accuracy: 0.5,
        batch_size: 8,
    };
    lenient.run(&ctx).expect("lenient gate passes");

    // 准确率不可能超过 1.0，这个阈值必然触发质量门
    let impossible = Evaluate {
        min_accuracy: 1.01,
        batch_size: 8,
    };
    assert!(impossible.run(&ctx).is_err(), "unreachable gate must fail");
}

#[test]
fn evaluate_fails_when_the_model_artifact_is_missing() {
    let dir = TempDir::new().unwrap();
    let ctx = StageCtx::new(dir.path());
    synthetic_build(&ctx);

    let gate = Evaluate {
        min_accuracy: 0.8,
        batch_size: 8,
    };
    assert!(gate.run(&ctx).is_err(), "缺失模型工件时评估阶段应当失败");
}

mod common;

use common::{write_chest, write_corrupt, FailingModel, IntensityModel};
use cxr_ssim::classify::ClassificationResult;
use cxr_ssim::error::RunError;
use cxr_ssim::pipeline::{Pipeline, PipelineConfig};
use cxr_ssim::segment::{SegmentationModel, Segmenter};
use cxr_ssim::Label;
use std::num::NonZeroUsize;
use std::path::Path;

const HEALTHY: u32 = 8;
const DISEASED: u32 = 23;

fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init();
}

/// 两张健康参考, 两张患病参考, 三张未知图像.
fn dataset(base: &Path) -> PipelineConfig {
    let cfg = PipelineConfig::under(base);
    write_chest(&cfg.healthy_dir, "h1.png", HEALTHY);
    write_chest(&cfg.healthy_dir, "h2.png", HEALTHY);
    write_chest(&cfg.diseased_dir, "d1.png", DISEASED);
    write_chest(&cfg.diseased_dir, "d2.png", DISEASED);
    write_chest(&cfg.unknown_dir, "u_healthy.png", HEALTHY);
    write_chest(&cfg.unknown_dir, "u_diseased.png", DISEASED);
    write_chest(&cfg.unknown_dir, "u_other.png", 12);
    cfg
}

fn pipeline<M: SegmentationModel>(cfg: PipelineConfig, model: M) -> Pipeline<M> {
    let segmenter =
        Segmenter::new(model).with_batch_size(NonZeroUsize::new(2).unwrap());
    Pipeline::new(cfg, segmenter)
}

fn by_name<'a>(results: &'a [ClassificationResult], name: &str) -> &'a ClassificationResult {
    results.iter().find(|r| r.name == name).unwrap()
}

#[test]
fn test_end_to_end() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(dir.path());
    let out = cfg.output_dir.clone();

    let outcome = pipeline(cfg, IntensityModel(0.3)).run().unwrap();
    assert_eq!(outcome.results.len(), 3);
    for r in outcome.results.iter() {
        assert!(r.n_healthy <= 2 && r.n_diseased <= 2);
        assert!(r.confidence >= 0.0);
        assert!(matches!(r.label, Label::Healthy | Label::Diseased));
    }

    let h = by_name(&outcome.results, "u_healthy.png");
    assert_eq!(h.label, Label::Healthy);
    assert_eq!((h.n_healthy, h.n_diseased), (2, 2));
    assert!((h.mean_healthy.unwrap() - 1.0).abs() < 1e-9);

    let d = by_name(&outcome.results, "u_diseased.png");
    assert_eq!(d.label, Label::Diseased);
    assert!(d.confidence > 0.0);

    // 报告: 表头 + 每张未知图像一行.
    assert_eq!(outcome.report_path, out.join("relatorio_classificacao.csv"));
    let report = std::fs::read_to_string(&outcome.report_path).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "imagem,ssim_medio_saudaveis,ssim_medio_doentes,classificacao,confianca,\
         n_comparacoes_saudavel,n_comparacoes_doente"
    );
    assert!(report.contains("u_healthy.png,"));
    assert!(report.contains(",Saudável,"));
    assert!(report.contains(",Doente,"));

    assert_eq!(outcome.summary.total, 3);
    assert_eq!(outcome.summary.errors, 0);
    assert_eq!(outcome.summary.healthy + outcome.summary.diseased, 3);

    // 分割结果副本.
    for (folder, name) in [
        ("segmented_valid_normais_frontal", "h1.png"),
        ("segmented_valid_Doentes_frontal", "d2.png"),
        ("segmented_valid_desconhecidos_frontal", "u_other.png"),
    ] {
        let saved = image::open(out.join(folder).join(name)).unwrap().into_luma8();
        assert_eq!(saved.dimensions(), (256, 256));
    }
}

#[test]
fn test_batched_and_each_agree() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(dir.path());

    let mut each = cfg.clone();
    each.batched = false;
    each.save_segmented = false;
    each.output_dir = dir.path().join("output-each");

    let a = pipeline(cfg, IntensityModel(0.3)).run().unwrap();
    let b = pipeline(each, IntensityModel(0.3)).run().unwrap();
    assert_eq!(a.results, b.results);
    assert!(!dir.path().join("output-each/segmented_valid_normais_frontal").exists());
}

#[test]
fn test_unreadable_unknown_is_skipped() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(dir.path());
    write_corrupt(&cfg.unknown_dir, "broken.png");

    let outcome = pipeline(cfg, IntensityModel(0.3)).run().unwrap();
    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.results.iter().all(|r| r.name != "broken.png"));
}

#[test]
fn test_single_reference_pool() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(dir.path());
    std::fs::remove_dir_all(&cfg.healthy_dir).unwrap();

    let outcome = pipeline(cfg, IntensityModel(0.3)).run().unwrap();
    for r in outcome.results.iter() {
        assert_eq!(r.label, Label::Diseased);
        assert_eq!(r.mean_healthy, None);
        assert_eq!(r.n_healthy, 0);
        assert_eq!(r.n_diseased, 2);
        assert_eq!(r.confidence, r.mean_diseased.unwrap());
    }
    assert_eq!(outcome.summary.mean_ssim_healthy, None);
}

#[test]
fn test_model_failure_does_not_abort() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(dir.path());

    // 全部图像退化为全零: 两边平均相似度相等, 平局判为患病.
    let outcome = pipeline(cfg, FailingModel).run().unwrap();
    assert_eq!(outcome.results.len(), 3);
    for r in outcome.results.iter() {
        assert_eq!(r.label, Label::Diseased);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.mean_healthy, r.mean_diseased);
    }
}

#[test]
fn test_no_references() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::under(dir.path());
    write_chest(&cfg.unknown_dir, "u.png", HEALTHY);
    write_corrupt(&cfg.healthy_dir, "broken.png");

    let err = pipeline(cfg.clone(), IntensityModel(0.3)).run().unwrap_err();
    assert!(matches!(err, RunError::NoReferences));
    assert!(!cfg.report_path().exists());
}

#[test]
fn test_no_unknowns() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::under(dir.path());
    write_chest(&cfg.healthy_dir, "h.png", HEALTHY);
    std::fs::create_dir_all(&cfg.unknown_dir).unwrap();

    let err = pipeline(cfg.clone(), IntensityModel(0.3)).run().unwrap_err();
    match err {
        RunError::NoUnknowns(p) => assert_eq!(p, cfg.unknown_dir),
        e => panic!("unexpected error: {e}"),
    }
    assert!(!cfg.report_path().exists());
}

#[test]
fn test_same_named_input_dirs_keep_separate_side_output() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    let mut cfg = PipelineConfig::under(base);
    cfg.healthy_dir = base.join("refs").join("x");
    cfg.unknown_dir = base.join("queue").join("x");
    write_chest(&cfg.healthy_dir, "h.png", HEALTHY);
    write_chest(&cfg.diseased_dir, "d.png", DISEASED);
    write_chest(&cfg.unknown_dir, "u.png", HEALTHY);
    let out = cfg.output_dir.clone();

    let p = pipeline(cfg.clone(), IntensityModel(0.3));
    assert_eq!(
        p.side_output_dir(&cfg.healthy_dir, "healthy"),
        out.join("segmented_x_healthy")
    );
    assert_eq!(
        p.side_output_dir(&cfg.diseased_dir, "diseased"),
        out.join("segmented_valid_Doentes_frontal")
    );

    p.run().unwrap();
    assert!(out.join("segmented_x_healthy/h.png").is_file());
    assert!(out.join("segmented_x_unknown/u.png").is_file());
    assert!(!out.join("segmented_x_unknown/h.png").exists());
    assert!(!out.join("segmented_x").exists());
}

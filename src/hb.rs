// 该文件是 Prima AI 项目的一部分。
// src/hb.rs - 指甲床 Hb 估计流程
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 检测 → 写标签 → 读标签裁剪指甲床 → 逐块回归 → 汇总。

use std::fmt::Display;
use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "annotate")]
use crate::output::draw::{Draw, DrawError};
use crate::{
  config::HbConfig,
  input::{ImageFileInput, ImageFileInputError},
  model::{
    BodySiteLabel, ClassifierFrame, Model, NAIL_CLASS_ID, NailHbRegressor, RegressorError,
    YoloBuilder, YoloError,
  },
  output::{
    DetectionRecordError, DetectionRecordOutput,
    label_file::{LabelFileError, LabelRecord, read_label_file},
  },
  report::{ErrorReport, HbReport},
  task::{OneShotTask, Task},
};

mod aggregate;
mod crop;
pub use self::aggregate::{HbSummary, NAIL_OBJECT_TYPE, summarize};
pub use self::crop::CropBounds;

/// 模型输出单位为 g/L，结果以 g/dL 给出
const G_PER_L_TO_G_PER_DL: f32 = 10.0;

pub const SOURCE_IMAGE_ERROR: &str = "Failed to read source image file.";

#[derive(Error, Debug)]
pub enum HbError {
  #[error("Failed to read source image file.")]
  SourceImage(#[from] ImageFileInputError),
  #[error("{0}")]
  Detector(#[from] YoloError),
  #[error("{0}")]
  Regressor(#[from] RegressorError),
  #[error("{0}")]
  Record(#[from] DetectionRecordError),
  #[error("{0}")]
  LabelFile(#[from] LabelFileError),
  #[cfg(feature = "annotate")]
  #[error("{0}")]
  Draw(#[from] DrawError),
  #[error("{0}")]
  Io(#[from] std::io::Error),
  #[error("{0:#}")]
  Task(#[from] anyhow::Error),
}

impl HbError {
  pub fn to_report(&self) -> ErrorReport {
    match self {
      HbError::SourceImage(_) => ErrorReport::new(SOURCE_IMAGE_ERROR),
      other => ErrorReport::new(format!(
        "An unexpected error occurred in hb processor: {}",
        other
      )),
    }
  }
}

/// 对单个裁剪区域预测 Hb（g/dL）
///
/// 预处理或推理失败时返回 `None`，只记录 debug 日志。
pub fn predict_hb<M>(model: &mut M, crop: &RgbImage) -> Option<f32>
where
  M: Model<Input = ClassifierFrame, Output = f32>,
  M::Error: Display,
{
  let frame = match ClassifierFrame::from_rgb8_resized(crop) {
    Ok(frame) => frame,
    Err(e) => {
      debug!("裁剪区域预处理失败: {}", e);
      return None;
    }
  };

  match model.infer(&frame) {
    Ok(value) => Some(value / G_PER_L_TO_G_PER_DL),
    Err(e) => {
      debug!("裁剪区域推理失败: {}", e);
      None
    }
  }
}

/// 取类别为指甲床的记录逐个裁剪并预测
pub fn estimate_from_labels<M>(model: &mut M, image: &RgbImage, records: &[LabelRecord]) -> Vec<f32>
where
  M: Model<Input = ClassifierFrame, Output = f32>,
  M::Error: Display,
{
  let (width, height) = image.dimensions();
  records
    .iter()
    .filter(|record| record.has_class(NAIL_CLASS_ID))
    .filter_map(|record| {
      let bounds = CropBounds::from_record(record, width, height);
      let crop = bounds.crop(image);
      if crop.is_none() {
        debug!("跳过空裁剪区域: {:?}", bounds);
      }
      crop
    })
    .filter_map(|crop| predict_hb(model, &crop))
    .collect()
}

pub fn build_report(predictions: &[f32], bounded_box_image_path: &Path) -> HbReport {
  let nail_bed_results = summarize(predictions)
    .map(|summary| vec![summary.to_result()])
    .unwrap_or_default();

  HbReport {
    detection_success: !nail_bed_results.is_empty(),
    nail_bed_results,
    conjunctiva_results: Vec::new(),
    bounded_box_image_path: bounded_box_image_path.display().to_string(),
  }
}

pub struct HbProcessor {
  config: HbConfig,
}

impl HbProcessor {
  pub fn new(config: HbConfig) -> Self {
    Self { config }
  }

  fn record_output(&self, input: &ImageFileInput) -> Result<DetectionRecordOutput, HbError> {
    let output = DetectionRecordOutput::new(self.config.run_dir(), input.file_name());

    #[cfg(feature = "annotate")]
    let output = match &self.config.font {
      Some(font) => output.with_draw(Draw::default().with_font_file(font)?),
      None => output,
    };

    Ok(output)
  }

  pub fn run(&self, image_path: &Path) -> Result<HbReport, HbError> {
    std::fs::create_dir_all(&self.config.output_dir)?;

    // 先解码源图像，读不了就不必加载模型
    let input = ImageFileInput::open(image_path)?;

    let detector = YoloBuilder::new(&self.config.detector_model)
      .confidence(self.config.confidence)
      .iou(self.config.iou)
      .build::<BodySiteLabel>()?;
    let output = self.record_output(&input)?;
    let detections = OneShotTask.run_task(input.image(), detector, &output)?;
    info!("检测到 {} 个目标", detections.len());

    let records = read_label_file(&output.label_path())?;
    let mut regressor = NailHbRegressor::load(&self.config.classifier_model)?;
    let predictions = estimate_from_labels(&mut regressor, input.image(), &records);
    info!(
      "{} 条标签记录, {} 个有效预测",
      records.len(),
      predictions.len()
    );

    Ok(build_report(&predictions, &output.image_path()))
  }
}

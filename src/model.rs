// 该文件是 Prima AI 项目的一部分。
// src/model.rs - 模型
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

use std::path::Path;

use ort::session::{Session, builder::GraphOptimizationLevel};
use tracing::info;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model> Model for &mut M {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: [f32; 4], // 归一化 [x_min, y_min, x_max, y_max]
}

impl<T> DetectItem<T> {
  /// 归一化的 `[x_center, y_center, width, height]`
  pub fn xywh(&self) -> [f32; 4] {
    let [x_min, y_min, x_max, y_max] = self.bbox;
    [
      (x_min + x_max) / 2.0,
      (y_min + y_max) / 2.0,
      x_max - x_min,
      y_max - y_min,
    ]
  }
}

#[derive(Debug, Clone)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

impl<T> DetectResult<T> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  fn from_label_id(id: u32) -> Self;
}

/// 检测模型训练时的类别，0 为指甲床
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySiteLabel {
  Nail,
  Other(u32),
}

pub const NAIL_CLASS_ID: u32 = 0;

impl WithLabel for BodySiteLabel {
  fn to_label_str(&self) -> String {
    match self {
      BodySiteLabel::Nail => "nail".to_string(),
      BodySiteLabel::Other(id) => format!("class{}", id),
    }
  }

  fn to_label_id(&self) -> u32 {
    match self {
      BodySiteLabel::Nail => NAIL_CLASS_ID,
      BodySiteLabel::Other(id) => *id,
    }
  }

  fn from_label_id(id: u32) -> Self {
    match id {
      NAIL_CLASS_ID => BodySiteLabel::Nail,
      other => BodySiteLabel::Other(other),
    }
  }
}

/// 以 CPU 推理方式打开 ONNX 会话
///
/// 构建器的错误类型随 ort 版本变化，这里统一转成字符串。
pub(crate) fn open_session(model_path: &Path) -> Result<Session, String> {
  info!("加载模型文件: {}", model_path.display());
  Session::builder()
    .map_err(|e| e.to_string())?
    .with_optimization_level(GraphOptimizationLevel::Level3)
    .map_err(|e| e.to_string())?
    .with_intra_threads(1)
    .map_err(|e| e.to_string())?
    .commit_from_file(model_path)
    .map_err(|e| e.to_string())
}

mod nail_regressor;
mod yolo;
pub use self::nail_regressor::{
  CLASSIFIER_INPUT_SIZE, ClassifierFrame, NailHbRegressor, RegressorError,
};
pub use self::yolo::{Letterbox, YOLO_INPUT_SIZE, YoloBuilder, YoloDetector, YoloError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_ids_round_trip() {
    assert_eq!(BodySiteLabel::from_label_id(0), BodySiteLabel::Nail);
    assert_eq!(BodySiteLabel::from_label_id(2), BodySiteLabel::Other(2));
    assert_eq!(BodySiteLabel::Other(2).to_label_id(), 2);
    assert_eq!(BodySiteLabel::Nail.to_label_str(), "nail");
  }

  #[test]
  fn xywh_from_corners() {
    let item = DetectItem {
      kind: BodySiteLabel::Nail,
      score: 0.9,
      bbox: [0.2, 0.4, 0.6, 0.5],
    };
    let [xc, yc, w, h] = item.xywh();
    assert!((xc - 0.4).abs() < 1e-6);
    assert!((yc - 0.45).abs() < 1e-6);
    assert!((w - 0.4).abs() < 1e-6);
    assert!((h - 0.1).abs() < 1e-6);
  }
}

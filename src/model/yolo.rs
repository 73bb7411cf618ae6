// 该文件是 Prima AI 项目的一部分。
// src/model/yolo.rs - YOLO 目标检测模型
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

use std::marker::PhantomData;
use std::path::PathBuf;

use image::{Rgb, RgbImage, imageops::FilterType};
use ndarray::{ArrayView2, Axis, Ix3};
use ort::{session::Session, value::Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  frame::{FrameError, RgbNchwFrame},
  model::{DetectItem, DetectResult, Model, WithLabel, open_session},
};

pub const YOLO_INPUT_SIZE: u32 = 640;
const YOLO_PAD_VALUE: u8 = 114;
const YOLO_MAX_DETECTIONS: usize = 300;
const YOLO_BOX_CHANNELS: usize = 4;

type YoloFrame = RgbNchwFrame<YOLO_INPUT_SIZE, YOLO_INPUT_SIZE>;

#[derive(Error, Debug)]
pub enum YoloError {
  #[error("模型文件不存在: {}", .0.display())]
  ModelNotFound(PathBuf),
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("输出形状无效: {0:?}")]
  InvalidOutput(Vec<usize>),
  #[error("输入帧错误: {0}")]
  FrameError(#[from] FrameError),
}

pub struct YoloBuilder {
  model_path: PathBuf,
  confidence: f32,
  iou: f32,
}

impl YoloBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      confidence: crate::config::DEFAULT_CONFIDENCE,
      iou: crate::config::DEFAULT_IOU,
    }
  }

  pub fn confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn iou(mut self, iou: f32) -> Self {
    self.iou = iou;
    self
  }

  pub fn build<T: WithLabel>(self) -> Result<YoloDetector<T>, YoloError> {
    if !self.model_path.is_file() {
      error!("检测模型不存在: {}", self.model_path.display());
      return Err(YoloError::ModelNotFound(self.model_path));
    }

    let session = open_session(&self.model_path).map_err(YoloError::ModelLoadError)?;
    info!(
      "检测模型加载完成 (置信度阈值 {}, NMS 阈值 {})",
      self.confidence, self.iou
    );

    Ok(YoloDetector {
      session,
      confidence: self.confidence,
      iou: self.iou,
      _phantom: PhantomData,
    })
  }
}

pub struct YoloDetector<T> {
  session: Session,
  confidence: f32,
  iou: f32,
  _phantom: PhantomData<T>,
}

/// 等比缩放并填充到正方形输入后的映射参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
  pub scale: f32,
  pub pad_x: u32,
  pub pad_y: u32,
  pub src_width: u32,
  pub src_height: u32,
}

impl Letterbox {
  pub fn apply(image: &RgbImage, size: u32) -> (RgbImage, Self) {
    let (src_width, src_height) = image.dimensions();
    let scale = (size as f32 / src_width as f32).min(size as f32 / src_height as f32);
    let new_w = ((src_width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((src_height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([YOLO_PAD_VALUE; 3]));
    image::imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
      canvas,
      Self {
        scale,
        pad_x,
        pad_y,
        src_width,
        src_height,
      },
    )
  }

  /// 输入空间坐标映射回源图像像素坐标
  pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
    let sx = ((x - self.pad_x as f32) / self.scale).clamp(0.0, self.src_width as f32);
    let sy = ((y - self.pad_y as f32) / self.scale).clamp(0.0, self.src_height as f32);
    (sx, sy)
  }
}

/// 源图像像素坐标下的候选框
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
  pub class_id: u32,
  pub score: f32,
  pub bbox: [f32; 4],
}

/// 解析 `[4 + nc, N]` 输出
pub(crate) fn decode_candidates(
  output: ArrayView2<f32>,
  letterbox: &Letterbox,
  confidence: f32,
) -> Vec<Candidate> {
  let channels = output.shape()[0];
  let num_classes = channels.saturating_sub(YOLO_BOX_CHANNELS);
  let mut candidates = Vec::new();
  if num_classes == 0 {
    return candidates;
  }

  for column in output.axis_iter(Axis(1)) {
    let (class_idx, score) = column
      .iter()
      .skip(YOLO_BOX_CHANNELS)
      .enumerate()
      .fold((0usize, f32::MIN), |best, (idx, &score)| {
        if score > best.1 { (idx, score) } else { best }
      });

    if score <= confidence {
      continue;
    }

    let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
    let (x_min, y_min) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
    let (x_max, y_max) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);

    candidates.push(Candidate {
      class_id: class_idx as u32,
      score,
      bbox: [x_min, y_min, x_max, y_max],
    });
  }

  candidates
}

/// 按类别的非极大值抑制
pub(crate) fn nms(
  mut candidates: Vec<Candidate>,
  iou_threshold: f32,
  limit: usize,
) -> Vec<Candidate> {
  // 按置信度降序排序
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut result: Vec<Candidate> = Vec::new();
  for candidate in candidates {
    if result.len() >= limit {
      break;
    }
    let suppressed = result.iter().any(|kept| {
      kept.class_id == candidate.class_id && iou(&kept.bbox, &candidate.bbox) > iou_threshold
    });
    if !suppressed {
      result.push(candidate);
    }
  }

  result
}

/// 计算两个边界框的 IoU
pub(crate) fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

impl<T: WithLabel> Model for YoloDetector<T> {
  type Input = RgbImage;
  type Output = DetectResult<T>;
  type Error = YoloError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("预处理输入图像 {}x{}", input.width(), input.height());
    let (boxed, letterbox) = Letterbox::apply(input, YOLO_INPUT_SIZE);
    let frame = YoloFrame::from_rgb8(&boxed)?;
    let tensor = Value::from_array(frame.into_array()?)?;

    debug!("执行模型推理");
    let outputs = self.session.run(ort::inputs![tensor])?;
    let output = outputs[0].try_extract_array::<f32>()?;
    let shape = output.shape().to_vec();
    let output = output
      .into_dimensionality::<Ix3>()
      .map_err(|_| YoloError::InvalidOutput(shape.clone()))?;
    if output.shape()[0] != 1 || output.shape()[1] <= YOLO_BOX_CHANNELS {
      return Err(YoloError::InvalidOutput(shape));
    }

    let candidates = decode_candidates(output.index_axis(Axis(0), 0), &letterbox, self.confidence);
    debug!("阈值过滤后候选框 {} 个", candidates.len());
    let kept = nms(candidates, self.iou, YOLO_MAX_DETECTIONS);

    let (w, h) = (letterbox.src_width as f32, letterbox.src_height as f32);
    let items: Vec<DetectItem<T>> = kept
      .into_iter()
      .map(|c| DetectItem {
        kind: T::from_label_id(c.class_id),
        score: c.score,
        bbox: [
          (c.bbox[0] / w).clamp(0.0, 1.0),
          (c.bbox[1] / h).clamp(0.0, 1.0),
          (c.bbox[2] / w).clamp(0.0, 1.0),
          (c.bbox[3] / h).clamp(0.0, 1.0),
        ],
      })
      .collect();

    info!("检测到 {} 个物体", items.len());
    debug!("检测结果: {:?}", items);

    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::Array2;

  fn identity_letterbox(size: u32) -> Letterbox {
    Letterbox {
      scale: 1.0,
      pad_x: 0,
      pad_y: 0,
      src_width: size,
      src_height: size,
    }
  }

  #[test]
  fn letterbox_pads_short_side() {
    let image = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
    let (boxed, lb) = Letterbox::apply(&image, 640);
    assert_eq!(boxed.dimensions(), (640, 640));
    assert!((lb.scale - 3.2).abs() < 1e-6);
    assert_eq!(lb.pad_x, 0);
    assert_eq!(lb.pad_y, 160);
    assert_eq!(boxed.get_pixel(0, 0), &Rgb([114, 114, 114]));
    assert_eq!(boxed.get_pixel(320, 320), &Rgb([0, 0, 0]));

    let (x, y) = lb.to_source(320.0, 160.0);
    assert!((x - 100.0).abs() < 1e-4);
    assert!(y.abs() < 1e-4);
  }

  #[test]
  fn decode_keeps_scores_above_threshold() {
    // 两个类别，三个候选
    let mut output = Array2::<f32>::zeros((6, 3));
    for (i, (cx, score0, score1)) in [(10.0, 0.9, 0.1), (20.0, 0.2, 0.25), (30.0, 0.1, 0.6)]
      .into_iter()
      .enumerate()
    {
      output[[0, i]] = cx;
      output[[1, i]] = cx;
      output[[2, i]] = 4.0;
      output[[3, i]] = 4.0;
      output[[4, i]] = score0;
      output[[5, i]] = score1;
    }

    let candidates = decode_candidates(output.view(), &identity_letterbox(64), 0.3);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].class_id, 0);
    assert_eq!(candidates[0].bbox, [8.0, 8.0, 12.0, 12.0]);
    assert_eq!(candidates[1].class_id, 1);
    assert!((candidates[1].score - 0.6).abs() < 1e-6);
  }

  #[test]
  fn nms_suppresses_same_class_only() {
    let a = Candidate {
      class_id: 0,
      score: 0.9,
      bbox: [0.0, 0.0, 10.0, 10.0],
    };
    let b = Candidate {
      class_id: 0,
      score: 0.8,
      bbox: [1.0, 1.0, 10.0, 10.0],
    };
    let c = Candidate {
      class_id: 1,
      score: 0.7,
      bbox: [1.0, 1.0, 10.0, 10.0],
    };
    let far = Candidate {
      class_id: 0,
      score: 0.5,
      bbox: [50.0, 50.0, 60.0, 60.0],
    };

    let kept = nms(vec![b, far, c, a], 0.7, 300);
    assert_eq!(kept, vec![a, c, far]);

    let limited = nms(vec![a, c, far], 0.7, 2);
    assert_eq!(limited.len(), 2);
  }

  #[test]
  fn iou_of_disjoint_boxes_is_zero() {
    assert_eq!(iou(&[0.0, 0.0, 1.0, 1.0], &[2.0, 2.0, 3.0, 3.0]), 0.0);
    assert!((iou(&[0.0, 0.0, 2.0, 2.0], &[0.0, 0.0, 2.0, 2.0]) - 1.0).abs() < 1e-6);
  }
}

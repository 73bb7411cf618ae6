// 该文件是 Prima AI 项目的一部分。
// src/hb/aggregate.rs - 多个裁剪区域的 Hb 汇总
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

use crate::{report::NailBedResult, utils::round_to};

pub const NAIL_OBJECT_TYPE: &str = "nail";
/// 每单位标准差扣除的置信度
const CONFIDENCE_PENALTY: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HbSummary {
  pub mean: f64,
  /// 总体标准差，少于两个样本时为 0
  pub std_dev: f64,
  pub confidence: f64,
}

/// 没有预测值时返回 `None`
pub fn summarize(predictions: &[f32]) -> Option<HbSummary> {
  if predictions.is_empty() {
    return None;
  }

  let count = predictions.len();
  let mean = predictions.iter().map(|&v| v as f64).sum::<f64>() / count as f64;
  let std_dev = if count > 1 {
    let variance = predictions
      .iter()
      .map(|&v| (v as f64 - mean).powi(2))
      .sum::<f64>()
      / count as f64;
    variance.sqrt()
  } else {
    0.0
  };

  Some(HbSummary {
    mean,
    std_dev,
    confidence: (100.0 - CONFIDENCE_PENALTY * std_dev).max(0.0),
  })
}

impl HbSummary {
  pub fn to_result(&self) -> NailBedResult {
    NailBedResult {
      object_type: NAIL_OBJECT_TYPE.to_string(),
      confidence: round_to(self.confidence, 1),
      hb_value: round_to(self.mean, 1),
    }
  }
}

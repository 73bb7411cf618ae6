// 该文件是 Prima AI 项目的一部分。
// src/report.rs - 标准输出 JSON 结果
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

use serde::Serialize;
use tracing::error;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorReport {
  pub error: String,
}

impl ErrorReport {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: message.into(),
    }
  }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NailBedResult {
  pub object_type: String,
  pub confidence: f64,
  pub hb_value: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HbReport {
  pub nail_bed_results: Vec<NailBedResult>,
  /// 结膜模型尚未提供，始终为空
  pub conjunctiva_results: Vec<serde_json::Value>,
  pub bounded_box_image_path: String,
  pub detection_success: bool,
}

/// 向 stdout 写出一个 JSON 对象
pub fn emit<T: Serialize>(report: &T) {
  match serde_json::to_string(report) {
    Ok(line) => println!("{}", line),
    Err(e) => {
      error!("结果序列化失败: {}", e);
      let fallback = ErrorReport::new(format!("Failed to serialize result: {}", e));
      println!(
        "{}",
        serde_json::to_string(&fallback).unwrap_or_else(|_| "{\"error\":\"\"}".to_string())
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn hb_report_uses_camel_case_keys() {
    let report = HbReport {
      nail_bed_results: vec![NailBedResult {
        object_type: "nail".to_string(),
        confidence: 100.0,
        hb_value: 12.3,
      }],
      conjunctiva_results: vec![],
      bounded_box_image_path: "/tmp/detection_result/a.jpg".to_string(),
      detection_success: true,
    };

    assert_eq!(
      serde_json::to_value(&report).unwrap(),
      json!({
        "nailBedResults": [{"objectType": "nail", "confidence": 100.0, "hbValue": 12.3}],
        "conjunctivaResults": [],
        "boundedBoxImagePath": "/tmp/detection_result/a.jpg",
        "detectionSuccess": true
      })
    );
  }

  #[test]
  fn error_report_has_single_field() {
    let value = serde_json::to_value(ErrorReport::new("boom")).unwrap();
    assert_eq!(value, json!({"error": "boom"}));
  }
}

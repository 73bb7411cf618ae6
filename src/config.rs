// 该文件是 Prima AI 项目的一部分。
// src/config.rs - 运行配置
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

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Gemini generateContent 接口地址
pub const GEMINI_ENDPOINT: &str =
  "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
/// 远程调用超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
/// 送去分析的最长视频时长（秒）
pub const DEFAULT_MAX_SECONDS: f64 = 10.0;

pub const MODEL_DIR: &str = "model";
pub const DETECTOR_MODEL_FILE: &str = "best.onnx";
pub const CLASSIFIER_MODEL_FILE: &str = "nail_only_model.onnx";
pub const OUTPUT_DIR: &str = "processed_images";
/// 检测产物所在的子目录，多次运行共用
pub const RUN_NAME: &str = "detection_result";

pub const DEFAULT_CONFIDENCE: f32 = 0.3;
pub const DEFAULT_IOU: f32 = 0.7;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法定位可执行文件: {0}")]
  CurrentExe(#[from] std::io::Error),
  #[error("可执行文件没有所在目录: {}", .0.display())]
  NoParent(PathBuf),
}

/// 默认基准目录：可执行文件所在目录的上一级
///
/// 模型与输出目录都相对于该目录解析。
pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
  let exe = std::env::current_exe()?;
  let exe_dir = exe
    .parent()
    .ok_or_else(|| ConfigError::NoParent(exe.clone()))?;
  Ok(exe_dir.join(".."))
}

/// 日记视频分析配置
#[derive(Debug, Clone)]
pub struct DiaryConfig {
  pub endpoint: Url,
  pub timeout: Duration,
  pub max_seconds: f64,
  pub ffmpeg: Option<PathBuf>,
}

impl Default for DiaryConfig {
  fn default() -> Self {
    Self {
      endpoint: Url::parse(GEMINI_ENDPOINT).expect("内置接口地址无效"),
      timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      max_seconds: DEFAULT_MAX_SECONDS,
      ffmpeg: None,
    }
  }
}

impl DiaryConfig {
  /// 带 `key` 查询参数的请求地址
  pub fn request_url(&self, api_key: &str) -> Url {
    let mut url = self.endpoint.clone();
    url.query_pairs_mut().append_pair("key", api_key);
    url
  }
}

/// Hb 估计流程配置
#[derive(Debug, Clone)]
pub struct HbConfig {
  pub detector_model: PathBuf,
  pub classifier_model: PathBuf,
  pub output_dir: PathBuf,
  pub confidence: f32,
  pub iou: f32,
  pub font: Option<PathBuf>,
}

impl HbConfig {
  pub fn with_base_dir(base_dir: &Path) -> Self {
    let model_dir = base_dir.join(MODEL_DIR);
    Self {
      detector_model: model_dir.join(DETECTOR_MODEL_FILE),
      classifier_model: model_dir.join(CLASSIFIER_MODEL_FILE),
      output_dir: base_dir.join(OUTPUT_DIR),
      confidence: DEFAULT_CONFIDENCE,
      iou: DEFAULT_IOU,
      font: None,
    }
  }

  pub fn run_dir(&self) -> PathBuf {
    self.output_dir.join(RUN_NAME)
  }
}

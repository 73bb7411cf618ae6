// 该文件是 Prima AI 项目的一部分。
// src/args.rs - 命令行参数
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
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, error::ErrorKind};
use url::Url;

use crate::{
  config::{
    DEFAULT_CONFIDENCE, DEFAULT_IOU, DEFAULT_MAX_SECONDS, DEFAULT_TIMEOUT_SECS, DiaryConfig,
    HbConfig,
  },
  report::{ErrorReport, emit},
};

pub const DIARY_MISSING_ARGS: &str = "Path video atau API key tidak disediakan.";
pub const HB_MISSING_ARGS: &str = "No image path provided to hb processor.";

/// 解析参数；缺少参数或参数无效时向 stdout 写出 JSON 错误
///
/// `--help` 与 `--version` 照常输出并退出。
pub fn parse_or_report<P: Parser>(missing_message: &str) -> Result<P, ExitCode> {
  parse_from_or_report(std::env::args_os(), missing_message)
}

pub fn parse_from_or_report<P, I, T>(args: I, missing_message: &str) -> Result<P, ExitCode>
where
  P: Parser,
  I: IntoIterator<Item = T>,
  T: Into<std::ffi::OsString> + Clone,
{
  match P::try_parse_from(args) {
    Ok(parsed) => Ok(parsed),
    Err(e) => match e.kind() {
      ErrorKind::DisplayHelp
      | ErrorKind::DisplayVersion
      | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
      ErrorKind::MissingRequiredArgument => {
        emit(&ErrorReport::new(missing_message));
        Err(ExitCode::FAILURE)
      }
      _ => {
        emit(&ErrorReport::new(e.render().to_string().trim()));
        Err(ExitCode::FAILURE)
      }
    },
  }
}

/// 截取视频开头并交给 Gemini 生成成长日记摘要
#[derive(Parser, Debug)]
#[command(name = "diary_analyzer", author, version, about, long_about = None)]
pub struct DiaryArgs {
  /// 视频文件路径
  #[arg(value_name = "VIDEO_PATH")]
  pub video_path: PathBuf,

  /// Gemini API key
  #[arg(value_name = "API_KEY")]
  pub api_key: String,

  /// generateContent 接口地址
  #[arg(long, env = "PRIMA_GEMINI_ENDPOINT", value_name = "URL")]
  pub endpoint: Option<Url>,

  /// 请求超时（秒）
  #[arg(
    long,
    env = "PRIMA_GEMINI_TIMEOUT",
    default_value_t = DEFAULT_TIMEOUT_SECS,
    value_name = "SECONDS"
  )]
  pub timeout_secs: u64,

  /// 送去分析的最长时长（秒）
  #[arg(long, default_value_t = DEFAULT_MAX_SECONDS, value_name = "SECONDS")]
  pub max_seconds: f64,

  /// FFmpeg 可执行文件，不指定时自动查找
  #[arg(long, env = "PRIMA_FFMPEG", value_name = "FILE")]
  pub ffmpeg: Option<PathBuf>,

  // 调用方可能附带多余参数，忽略即可
  #[arg(hide = true, value_name = "IGNORED")]
  pub extra: Vec<String>,
}

impl DiaryArgs {
  pub fn to_config(&self) -> DiaryConfig {
    let defaults = DiaryConfig::default();
    DiaryConfig {
      endpoint: self.endpoint.clone().unwrap_or(defaults.endpoint),
      timeout: Duration::from_secs(self.timeout_secs),
      max_seconds: self.max_seconds,
      ffmpeg: self.ffmpeg.clone(),
    }
  }
}

/// 检测指甲床并估计 Hb
#[derive(Parser, Debug)]
#[command(name = "hb_processor", author, version, about, long_about = None)]
pub struct HbArgs {
  /// 源图像路径
  #[arg(value_name = "IMAGE_PATH")]
  pub image_path: PathBuf,

  /// 模型与输出目录的基准目录，默认是可执行文件所在目录的上一级
  #[arg(long, env = "PRIMA_BASE_DIR", value_name = "DIR")]
  pub base_dir: Option<PathBuf>,

  /// YOLO 检测模型（ONNX）
  #[arg(long, value_name = "FILE")]
  pub detector_model: Option<PathBuf>,

  /// Hb 回归模型（ONNX）
  #[arg(long, value_name = "FILE")]
  pub classifier_model: Option<PathBuf>,

  /// 检测结果输出目录
  #[arg(long, value_name = "DIR")]
  pub output_dir: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU, value_name = "THRESHOLD")]
  pub iou: f32,

  /// 标注标签使用的 TTF/OTF 字体，不指定时只画框
  #[arg(long, env = "PRIMA_FONT", value_name = "FILE")]
  pub font: Option<PathBuf>,

  #[arg(hide = true, value_name = "IGNORED")]
  pub extra: Vec<String>,
}

impl HbArgs {
  pub fn to_config(&self, base_dir: &Path) -> HbConfig {
    let mut config = HbConfig::with_base_dir(base_dir);
    if let Some(path) = &self.detector_model {
      config.detector_model = path.clone();
    }
    if let Some(path) = &self.classifier_model {
      config.classifier_model = path.clone();
    }
    if let Some(path) = &self.output_dir {
      config.output_dir = path.clone();
    }
    config.confidence = self.confidence;
    config.iou = self.iou;
    config.font = self.font.clone();
    config
  }
}

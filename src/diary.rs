// 该文件是 Prima AI 项目的一部分。
// src/diary.rs - 日记视频分析
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

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{config::DiaryConfig, report::ErrorReport, video::Trimmer};

mod gemini;
pub use self::gemini::{
  GeminiClient, GeminiResponse, GenerateContentRequest, PROMPT, VIDEO_MIME_TYPE,
};

/// 错误信息直接返回给调用方，保持印尼语原文
#[derive(Error, Debug)]
pub enum AnalysisError {
  #[error("Error jaringan saat menghubungi Gemini API: {0}")]
  Transport(String),
  #[error("Format respons dari Gemini API tidak terduga: {detail}. Respons: {body}")]
  ResponseShape { detail: String, body: String },
  #[error("Gagal mem-parsing JSON dari respons Gemini: {detail}. Teks mentah: '{text}'")]
  EmbeddedJson { detail: String, text: String },
  #[error("Terjadi error yang tidak diketahui saat analisis video: {0}")]
  Unknown(String),
}

impl From<reqwest::Error> for AnalysisError {
  fn from(e: reqwest::Error) -> Self {
    // 地址里带着 API key，不能出现在错误信息中
    AnalysisError::Transport(e.without_url().to_string())
  }
}

impl AnalysisError {
  pub fn to_report(&self) -> ErrorReport {
    ErrorReport::new(self.to_string())
  }
}

/// 去掉首尾空白以及所有 ```` ```json ```` 与 ```` ``` ```` 标记
pub fn strip_code_fences(raw: &str) -> String {
  raw
    .trim()
    .replace("```json", "")
    .replace("```", "")
    .trim()
    .to_string()
}

/// 解析模型在文本中返回的 JSON
pub fn parse_embedded(raw: &str) -> Result<Value, AnalysisError> {
  let cleaned = strip_code_fences(raw);
  serde_json::from_str(&cleaned).map_err(|e| AnalysisError::EmbeddedJson {
    detail: e.to_string(),
    text: cleaned,
  })
}

pub fn encode_video(path: &Path) -> Result<String, AnalysisError> {
  let bytes = std::fs::read(path).map_err(|e| {
    AnalysisError::Unknown(format!("无法读取视频文件 {}: {}", path.display(), e))
  })?;
  debug!("视频大小 {} 字节", bytes.len());
  Ok(general_purpose::STANDARD.encode(bytes))
}

pub struct DiaryAnalyzer {
  client: GeminiClient,
  trimmer: Trimmer,
}

impl DiaryAnalyzer {
  pub fn new(config: DiaryConfig) -> Result<Self, AnalysisError> {
    let trimmer = Trimmer::new(config.max_seconds).with_ffmpeg(config.ffmpeg.clone());
    let client = GeminiClient::new(config)?;
    Ok(Self { client, trimmer })
  }

  /// 不做截取，直接分析给定文件
  pub fn analyze_file(&self, video: &Path, api_key: &str) -> Result<Value, AnalysisError> {
    let video_base64 = encode_video(video)?;
    let request = GenerateContentRequest::with_video(PROMPT, &video_base64);
    let response = self.client.generate_content(api_key, &request)?;
    let raw = response.text()?;
    let result = parse_embedded(raw)?;
    info!("分析完成");
    Ok(result)
  }

  /// 截取 → 分析 → 删除临时文件，无论分析结果如何都会清理
  pub fn analyze(&self, video: &Path, api_key: &str) -> Result<Value, AnalysisError> {
    let trimmed = self.trimmer.trim(video);
    let result = self.analyze_file(trimmed.path(), api_key);
    trimmed.close();
    result
  }
}

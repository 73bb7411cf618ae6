// 该文件是 Prima AI 项目的一部分。
// src/diary/gemini.rs - Gemini generateContent 客户端
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

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{config::DiaryConfig, diary::AnalysisError};

pub const VIDEO_MIME_TYPE: &str = "video/mp4";

pub const PROMPT: &str = concat!(
  "Analisis video ini dan berikan ringkasan perkembangannya. ",
  "Fokus pada interaksi, suara, dan gerakan bayi. ",
  "Hasil harus dalam format JSON dengan kunci berikut: 'summary' (string). ",
  "Isi 'summary' harus berupa satu paragraf naratif yang ringkas (maksimal 3 kalimat) ",
  "menjelaskan momen dalam video. ",
  "Contoh: {\"summary\": \"Di video ini, si kecil terlihat senang merespon saat diajak ",
  "bermain cilukba dan beberapa kali meniru suara tawa orang tuanya. ",
  "Gerakannya aktif dan ia tampak ceria.\"} ",
  "Jangan tambahkan markdown atau karakter lain di luar JSON object."
);

#[derive(Serialize, Debug)]
pub struct GenerateContentRequest<'a> {
  contents: Vec<Content<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
  role: &'a str,
  parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part<'a> {
  Text { text: &'a str },
  InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize, Debug)]
struct InlineData<'a> {
  mime_type: &'a str,
  data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
  /// 一条用户消息：提示词 + base64 编码的 mp4
  pub fn with_video(prompt: &'a str, video_base64: &'a str) -> Self {
    Self {
      contents: vec![Content {
        role: "user",
        parts: vec![
          Part::Text { text: prompt },
          Part::InlineData {
            inline_data: InlineData {
              mime_type: VIDEO_MIME_TYPE,
              data: video_base64,
            },
          },
        ],
      }],
    }
  }
}

/// 解析后的响应以及原始响应体
#[derive(Debug)]
pub struct GeminiResponse {
  pub value: Value,
  pub body: String,
}

enum Step {
  Key(&'static str),
  Index(usize),
}

const TEXT_PATH: [Step; 6] = [
  Step::Key("candidates"),
  Step::Index(0),
  Step::Key("content"),
  Step::Key("parts"),
  Step::Index(0),
  Step::Key("text"),
];

impl Step {
  fn push_to(&self, path: &mut String) {
    match self {
      Step::Key(key) if path.is_empty() => path.push_str(key),
      Step::Key(key) => {
        path.push('.');
        path.push_str(key);
      }
      Step::Index(idx) => path.push_str(&format!("[{}]", idx)),
    }
  }
}

impl GeminiResponse {
  /// 取 `candidates[0].content.parts[0].text`
  ///
  /// 缺键或越界属于响应格式错误，类型不符归入未知错误。
  pub fn text(&self) -> Result<&str, AnalysisError> {
    let shape_error = |detail: String| AnalysisError::ResponseShape {
      detail,
      body: self.body.clone(),
    };

    let mut path = String::new();
    let mut current = &self.value;
    for step in TEXT_PATH.iter() {
      let parent = if path.is_empty() {
        "响应".to_string()
      } else {
        path.clone()
      };
      step.push_to(&mut path);
      current = match (step, current) {
        (Step::Key(key), Value::Object(map)) => map
          .get(*key)
          .ok_or_else(|| shape_error(format!("'{}'", key)))?,
        (Step::Index(idx), Value::Array(items)) => items
          .get(*idx)
          .ok_or_else(|| shape_error(format!("{} 越界", path)))?,
        (Step::Index(_), Value::Object(_)) => {
          return Err(shape_error(format!("{} 是对象而不是数组", parent)));
        }
        (Step::Key(_), _) => {
          return Err(AnalysisError::Unknown(format!("{} 不是对象", parent)));
        }
        (Step::Index(_), _) => {
          return Err(AnalysisError::Unknown(format!("{} 不是数组", parent)));
        }
      };
    }

    current
      .as_str()
      .ok_or_else(|| AnalysisError::Unknown(format!("{} 不是字符串", path)))
  }
}

pub struct GeminiClient {
  client: Client,
  config: DiaryConfig,
}

impl GeminiClient {
  pub fn new(config: DiaryConfig) -> Result<Self, AnalysisError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  /// 发送请求；连接失败、超时、非 2xx 状态以及响应体不是 JSON 都视为网络错误
  pub fn generate_content(
    &self,
    api_key: &str,
    request: &GenerateContentRequest<'_>,
  ) -> Result<GeminiResponse, AnalysisError> {
    info!("请求 Gemini API: {}", self.config.endpoint);
    let now = std::time::Instant::now();
    let response = self
      .client
      .post(self.config.request_url(api_key))
      .json(request)
      .send()?
      .error_for_status()?;
    let body = response.text()?;
    info!(
      "Gemini API 响应 {} 字节，耗时: {:.2?}",
      body.len(),
      now.elapsed()
    );

    let value = serde_json::from_str(&body)
      .map_err(|e| AnalysisError::Transport(format!("响应不是有效的 JSON: {}", e)))?;
    debug!("Gemini API 响应: {}", body);
    Ok(GeminiResponse { value, body })
  }
}

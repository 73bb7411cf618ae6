// 该文件是 Prima AI 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use serde_json::Value;

/// 只应答一次的 HTTP 服务，返回收到的原始请求
pub struct OneShotServer {
  pub url: String,
  handle: JoinHandle<String>,
}

impl OneShotServer {
  pub fn respond(status: u16, body: impl Into<String>) -> Self {
    let body = body.into();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    let handle = std::thread::spawn(move || {
      let (mut stream, _) = listener.accept().expect("accept test connection");
      let request = read_request(&mut stream);
      let reason = if status < 400 { "OK" } else { "Error" };
      let response = format!(
        concat!(
          "HTTP/1.1 {} {}\r\n",
          "Content-Type: application/json\r\n",
          "Content-Length: {}\r\n",
          "Connection: close\r\n\r\n{}"
        ),
        status,
        reason,
        body.len(),
        body
      );
      stream
        .write_all(response.as_bytes())
        .expect("write test response");
      request
    });

    Self {
      url: format!("http://{}/v1beta/models/test:generateContent", addr),
      handle,
    }
  }

  pub fn request(self) -> String {
    self.handle.join().expect("test server thread")
  }
}

fn read_request(stream: &mut impl Read) -> String {
  let mut data = Vec::new();
  let mut buf = [0u8; 8192];
  loop {
    let n = stream.read(&mut buf).expect("read test request");
    if n == 0 {
      break;
    }
    data.extend_from_slice(&buf[..n]);

    let Some(header_end) = find(&data, b"\r\n\r\n") else {
      continue;
    };
    let headers = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let length = headers
      .lines()
      .find_map(|line| line.strip_prefix("content-length:"))
      .and_then(|v| v.trim().parse::<usize>().ok())
      .unwrap_or(0);
    if data.len() >= header_end + 4 + length {
      break;
    }
  }
  String::from_utf8_lossy(&data).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|w| w == needle)
}

/// 一个必定拒绝连接的本地地址
pub fn closed_endpoint() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
  let addr = listener.local_addr().expect("listener address");
  drop(listener);
  format!("http://{}/generate", addr)
}

/// Gemini 风格的响应体，`text` 放在第一个候选的第一段
pub fn gemini_body(text: &str) -> String {
  serde_json::json!({
    "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
  })
  .to_string()
}

pub fn stdout_json(output: &std::process::Output) -> Value {
  let stdout = String::from_utf8_lossy(&output.stdout);
  let line = stdout.trim();
  assert_eq!(line.lines().count(), 1, "stdout should be one line: {stdout}");
  serde_json::from_str(line).expect("stdout should be JSON")
}

/// 检测与回归模型；设置 `PRIMA_TEST_MODEL_DIR` 或放在 `model/` 下
pub fn model_dir() -> Option<PathBuf> {
  let dir = std::env::var_os("PRIMA_TEST_MODEL_DIR")
    .map(PathBuf::from)
    .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("model"));
  let present = dir.join("best.onnx").is_file() && dir.join("nail_only_model.onnx").is_file();
  if !present {
    eprintln!("skipping test because models are missing in {}", dir.display());
    return None;
  }
  Some(dir)
}

// 该文件是 Prima AI 项目的一部分。
// src/video/ffmpeg.rs - FFmpeg / FFprobe 子进程
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

use std::{
  path::{Path, PathBuf},
  process::{Command, Stdio},
};

use thiserror::Error;
use tracing::{debug, info};

// 常见安装路径
const COMMON_PATHS: &[&str] = &[
  "/opt/homebrew/bin/ffmpeg",
  "/usr/local/bin/ffmpeg",
  "/opt/local/bin/ffmpeg",
  "/usr/bin/ffmpeg",
];

pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";

#[derive(Error, Debug)]
pub enum FfmpegError {
  #[error("未找到 FFmpeg")]
  NotFound,
  #[error("指定的 FFmpeg 无法执行: {}", .0.display())]
  NotRunnable(PathBuf),
  #[error("无法启动 {}: {source}", .program.display())]
  Spawn {
    program: PathBuf,
    source: std::io::Error,
  },
  #[error("{} 退出码 {code:?}: {stderr}", .program.display())]
  Failed {
    program: PathBuf,
    code: Option<i32>,
    stderr: String,
  },
  #[error("无法解析 FFprobe 输出: {0}")]
  Probe(String),
}

fn is_runnable(program: &Path) -> bool {
  Command::new(program)
    .arg("-version")
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .map(|status| status.success())
    .unwrap_or(false)
}

/// 同目录下的 ffprobe；裸命令名时同样按 PATH 查找
fn sibling_ffprobe(ffmpeg: &Path) -> PathBuf {
  let name = if cfg!(target_os = "windows") {
    "ffprobe.exe"
  } else {
    "ffprobe"
  };
  match ffmpeg.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
    _ => PathBuf::from(name),
  }
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
  ffmpeg: PathBuf,
  ffprobe: PathBuf,
}

impl Ffmpeg {
  /// 指定路径时只使用该路径，否则依次尝试常见安装路径与 PATH
  pub fn locate(preferred: Option<&Path>) -> Result<Self, FfmpegError> {
    if let Some(path) = preferred {
      if is_runnable(path) {
        info!("使用指定的 FFmpeg: {}", path.display());
        return Ok(Self::with_binary(path));
      }
      return Err(FfmpegError::NotRunnable(path.to_path_buf()));
    }

    for path in COMMON_PATHS.iter().map(Path::new) {
      if path.exists() && is_runnable(path) {
        info!("使用系统 FFmpeg: {}", path.display());
        return Ok(Self::with_binary(path));
      }
    }

    let bare = Path::new("ffmpeg");
    if is_runnable(bare) {
      info!("使用 PATH 中的 FFmpeg");
      return Ok(Self::with_binary(bare));
    }

    Err(FfmpegError::NotFound)
  }

  pub fn with_binary(ffmpeg: &Path) -> Self {
    Self {
      ffmpeg: ffmpeg.to_path_buf(),
      ffprobe: sibling_ffprobe(ffmpeg),
    }
  }

  pub fn ffmpeg_path(&self) -> &Path {
    &self.ffmpeg
  }

  fn run(mut command: Command) -> Result<Vec<u8>, FfmpegError> {
    let program = PathBuf::from(command.get_program());
    debug!("执行 {:?}", command);
    let output = command
      .stdin(Stdio::null())
      .output()
      .map_err(|source| FfmpegError::Spawn {
        program: program.clone(),
        source,
      })?;

    if !output.status.success() {
      return Err(FfmpegError::Failed {
        program,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(output.stdout)
  }

  /// 容器时长（秒）
  pub fn probe_duration(&self, input: &Path) -> Result<f64, FfmpegError> {
    let mut command = Command::new(&self.ffprobe);
    command
      .args(["-v", "quiet", "-print_format", "json", "-show_format"])
      .arg(input);
    let stdout = Self::run(command)?;

    let json: serde_json::Value =
      serde_json::from_slice(&stdout).map_err(|e| FfmpegError::Probe(e.to_string()))?;
    json["format"]["duration"]
      .as_str()
      .and_then(|s| s.parse::<f64>().ok())
      .ok_or_else(|| FfmpegError::Probe("缺少 format.duration".to_string()))
  }

  /// 重新编码前 `seconds` 秒，覆盖 `output`
  pub fn trim(&self, input: &Path, output: &Path, seconds: f64) -> Result<(), FfmpegError> {
    let seconds = format!("{:.3}", seconds);
    let mut command = Command::new(&self.ffmpeg);
    command
      .args(["-y", "-v", "error", "-i"])
      .arg(input)
      .arg("-t")
      .arg(&seconds)
      .args(["-c:v", VIDEO_CODEC, "-c:a", AUDIO_CODEC, "-f", "mp4"])
      .arg(output);
    Self::run(command)?;
    Ok(())
  }
}

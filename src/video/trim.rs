// 该文件是 Prima AI 项目的一部分。
// src/video/trim.rs - 截取视频开头片段
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

use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  config::DEFAULT_MAX_SECONDS,
  video::ffmpeg::{Ffmpeg, FfmpegError},
};

const TRIMMED_PREFIX: &str = "trimmed_10s_";
const TRIMMED_SUFFIX: &str = ".mp4";

#[derive(Error, Debug)]
pub enum TrimError {
  #[error("视频文件不存在: {}", .0.display())]
  InputMissing(PathBuf),
  #[error("{0}")]
  Ffmpeg(#[from] FfmpegError),
  #[error("无法创建临时文件: {0}")]
  TempFile(#[from] std::io::Error),
}

/// 送去分析的视频
///
/// 截取成功时持有输入目录下的临时文件，`close` 或 drop 时删除。
#[derive(Debug)]
pub enum TrimmedVideo {
  Original(PathBuf),
  Trimmed(TempPath),
}

impl TrimmedVideo {
  pub fn path(&self) -> &Path {
    match self {
      TrimmedVideo::Original(path) => path,
      TrimmedVideo::Trimmed(path) => path,
    }
  }

  pub fn is_trimmed(&self) -> bool {
    matches!(self, TrimmedVideo::Trimmed(_))
  }

  /// 删除临时文件，失败只记录警告
  pub fn close(self) {
    if let TrimmedVideo::Trimmed(path) = self {
      let temp_display = path.to_path_buf();
      match path.close() {
        Ok(()) => debug!("删除临时视频: {}", temp_display.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
          "Warning: Tidak dapat menghapus file sementara {}: {}",
          temp_display.display(),
          e
        ),
      }
    }
  }
}

pub struct Trimmer {
  max_seconds: f64,
  ffmpeg: Option<PathBuf>,
}

impl Default for Trimmer {
  fn default() -> Self {
    Self {
      max_seconds: DEFAULT_MAX_SECONDS,
      ffmpeg: None,
    }
  }
}

impl Trimmer {
  pub fn new(max_seconds: f64) -> Self {
    Self {
      max_seconds,
      ..Self::default()
    }
  }

  pub fn with_ffmpeg(mut self, ffmpeg: Option<PathBuf>) -> Self {
    self.ffmpeg = ffmpeg;
    self
  }

  /// 截取开头 `min(时长, max_seconds)` 秒；任何失败都退回原始文件
  pub fn trim(&self, input: &Path) -> TrimmedVideo {
    match self.try_trim(input) {
      Ok(video) => video,
      Err(e) => {
        warn!("Warning: Gagal memotong video: {}. Menggunakan video asli.", e);
        TrimmedVideo::Original(input.to_path_buf())
      }
    }
  }

  pub fn try_trim(&self, input: &Path) -> Result<TrimmedVideo, TrimError> {
    if !input.is_file() {
      return Err(TrimError::InputMissing(input.to_path_buf()));
    }

    let ffmpeg = Ffmpeg::locate(self.ffmpeg.as_deref())?;
    let seconds = match ffmpeg.probe_duration(input) {
      Ok(duration) => {
        debug!("原始视频时长 {:.2}s", duration);
        duration.min(self.max_seconds)
      }
      Err(e) => {
        debug!("无法获取视频时长, 按上限截取: {}", e);
        self.max_seconds
      }
    };

    let dir = match input.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
      .prefix(TRIMMED_PREFIX)
      .suffix(TRIMMED_SUFFIX)
      .tempfile_in(dir)?
      .into_temp_path();

    ffmpeg.trim(input, &temp, seconds)?;
    info!("截取视频前 {:.2}s 到 {}", seconds, temp.display());

    Ok(TrimmedVideo::Trimmed(temp))
  }
}

pub fn trim_to_duration(input: &Path, max_seconds: f64, ffmpeg: Option<PathBuf>) -> TrimmedVideo {
  Trimmer::new(max_seconds).with_ffmpeg(ffmpeg).trim(input)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leftover_temp_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
      .unwrap()
      .filter_map(Result::ok)
      .filter(|e| e.file_name().to_string_lossy().starts_with(TRIMMED_PREFIX))
      .count()
  }

  /// 生成 `seconds` 秒的测试视频，本机 FFmpeg 不可用时返回 `None`
  fn make_video(dir: &Path, seconds: u32) -> Option<(Ffmpeg, PathBuf)> {
    let ffmpeg = Ffmpeg::locate(None).ok()?;
    let path = dir.join("clip.mp4");
    let status = std::process::Command::new(ffmpeg.ffmpeg_path())
      .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
      .arg(format!("testsrc=duration={}:size=64x64:rate=10", seconds))
      .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
      .arg(&path)
      .status()
      .ok()?;
    status.success().then_some((ffmpeg, path))
  }

  #[test]
  fn missing_input_falls_back_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.mp4");

    let video = Trimmer::default().trim(&input);

    assert!(!video.is_trimmed());
    assert_eq!(video.path(), input);
  }

  #[test]
  fn unusable_ffmpeg_falls_back_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("diary.mp4");
    std::fs::write(&input, b"not really a video").unwrap();

    let video = Trimmer::default()
      .with_ffmpeg(Some(dir.path().join("no-ffmpeg")))
      .trim(&input);

    assert_eq!(video.path(), input);
    assert_eq!(leftover_temp_files(dir.path()), 0);
    video.close();
    assert!(input.is_file());
  }

  #[test]
  fn undecodable_input_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    if Ffmpeg::locate(None).is_err() {
      eprintln!("skipping: ffmpeg not installed");
      return;
    }
    let input = dir.path().join("diary.mp4");
    std::fs::write(&input, b"not really a video").unwrap();

    let video = Trimmer::default().trim(&input);

    assert!(!video.is_trimmed());
    assert_eq!(leftover_temp_files(dir.path()), 0);
  }

  #[test]
  fn long_video_is_cut_and_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let Some((ffmpeg, input)) = make_video(dir.path(), 12) else {
      eprintln!("skipping: ffmpeg with libx264 not available");
      return;
    };

    let video = Trimmer::default().trim(&input);
    assert!(video.is_trimmed());
    let trimmed = video.path().to_path_buf();
    assert_eq!(trimmed.parent(), input.parent());
    if let Ok(duration) = ffmpeg.probe_duration(&trimmed) {
      assert!(duration <= 10.1, "trimmed duration {}", duration);
    }

    video.close();
    assert!(!trimmed.exists());
    assert!(input.is_file());
  }

  #[test]
  fn dropping_trimmed_video_deletes_file() {
    let dir = tempfile::tempdir().unwrap();
    let Some((_, input)) = make_video(dir.path(), 2) else {
      eprintln!("skipping: ffmpeg with libx264 not available");
      return;
    };

    let trimmed = {
      let video = Trimmer::new(1.0).trim(&input);
      assert!(video.is_trimmed());
      video.path().to_path_buf()
    };

    assert!(!trimmed.exists());
  }
}

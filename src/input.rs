// 该文件是 Prima AI 项目的一部分。
// src/input.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Path has no file name: {}", .0.display())]
  NoFileName(PathBuf),
}

/// 已解码为 RGB8 的源图像
pub struct ImageFileInput {
  path: PathBuf,
  image: RgbImage,
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    if path.file_name().is_none() {
      return Err(ImageFileInputError::NoFileName(path.to_path_buf()));
    }

    let image = ImageReader::open(path)?
      .with_guessed_format()?
      .decode()?
      .to_rgb8();
    debug!(
      "读取源图像 {}: {}x{}",
      path.display(),
      image.width(),
      image.height()
    );

    Ok(Self {
      path: path.to_path_buf(),
      image,
    })
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  /// 文件名（含扩展名），`open` 已保证存在
  pub fn file_name(&self) -> &std::ffi::OsStr {
    self.path.file_name().unwrap_or_default()
  }
}

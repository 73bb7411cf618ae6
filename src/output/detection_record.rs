// 该文件是 Prima AI 项目的一部分。
// src/output/detection_record.rs - 检测结果目录记录
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
  ffi::{OsStr, OsString},
  path::{Path, PathBuf},
};

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "annotate")]
use crate::output::draw::Draw;
use crate::{
  model::{DetectResult, WithLabel},
  output::{
    Render,
    label_file::{LabelFileError, LabelRecord, write_label_file},
  },
};

pub const LABELS_DIR: &str = "labels";

#[derive(Error, Debug)]
pub enum DetectionRecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("标签文件错误: {0}")]
  LabelFileError(#[from] LabelFileError),
}

/// 单张图像的检测记录
///
/// 标注图保存为 `<run_dir>/<文件名>`，标签保存为 `<run_dir>/labels/<主文件名>.txt`。
/// 标签文件每次覆盖写入，没有检测结果时删除旧文件。
pub struct DetectionRecordOutput {
  run_dir: PathBuf,
  file_name: OsString,
  #[cfg(feature = "annotate")]
  draw: Draw,
}

impl DetectionRecordOutput {
  pub fn new(run_dir: impl Into<PathBuf>, file_name: &OsStr) -> Self {
    Self {
      run_dir: run_dir.into(),
      file_name: file_name.to_os_string(),
      #[cfg(feature = "annotate")]
      draw: Draw::default(),
    }
  }

  #[cfg(feature = "annotate")]
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn image_path(&self) -> PathBuf {
    self.run_dir.join(&self.file_name)
  }

  pub fn label_path(&self) -> PathBuf {
    self
      .run_dir
      .join(LABELS_DIR)
      .join(Path::new(&self.file_name).with_extension("txt"))
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), DetectionRecordError> {
    let path = self.image_path();
    // 扩展名不是可编码格式时按 PNG 写入
    let format = ImageFormat::from_path(&path).unwrap_or(ImageFormat::Png);
    image.save_with_format(&path, format)?;
    info!("保存标注图像: {}", path.display());
    Ok(())
  }

  fn save_labels<T: WithLabel>(
    &self,
    result: &DetectResult<T>,
  ) -> Result<(), DetectionRecordError> {
    let path = self.label_path();
    if result.is_empty() {
      match std::fs::remove_file(&path) {
        Ok(()) => debug!("删除旧标签文件: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
      }
      return Ok(());
    }

    let records = result
      .items
      .iter()
      .map(LabelRecord::from_item)
      .collect::<Vec<_>>();
    write_label_file(&path, &records)?;
    Ok(())
  }
}

impl<T: WithLabel> Render<RgbImage, DetectResult<T>> for DetectionRecordOutput {
  type Error = DetectionRecordError;

  fn render_result(&self, frame: &RgbImage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    std::fs::create_dir_all(&self.run_dir)?;

    #[cfg(feature = "annotate")]
    let image = {
      let mut image = frame.clone();
      self.draw.draw_detections(&mut image, result);
      image
    };
    #[cfg(not(feature = "annotate"))]
    let image = frame.clone();

    self.save_image(&image)?;
    self.save_labels(result)
  }
}

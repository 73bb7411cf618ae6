// 该文件是 Prima AI 项目的一部分。
// src/frame.rs - NCHW 浮点帧定义
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

use image::{DynamicImage, Rgb32FImage, RgbImage, imageops::FilterType};
use ndarray::Array4;
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("图像尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  SizeMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
  #[error("空图像无法转换为帧")]
  Empty,
  #[error("张量形状错误: {0}")]
  Shape(#[from] ndarray::ShapeError),
}

/// `[1, 3, H, W]` 布局、取值 `[0, 1]` 的 RGB 帧
#[derive(Debug, Clone)]
pub struct RgbNchwFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> Default for RgbNchwFrame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    Self {
      data: vec![0f32; size].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> RgbNchwFrame<W, H> {
  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }

  /// 从已是 W×H 的 8 位图像构造，像素除以 255
  pub fn from_rgb8(image: &RgbImage) -> Result<Self, FrameError> {
    if image.dimensions() != (W, H) {
      return Err(FrameError::SizeMismatch {
        expected: (W, H),
        actual: image.dimensions(),
      });
    }

    let mut frame = Self::default();
    let plane = W as usize * H as usize;
    for (x, y, pixel) in image.enumerate_pixels() {
      let idx = y as usize * W as usize + x as usize;
      for c in 0..RGB_CHANNELS {
        frame.data[c * plane + idx] = pixel[c] as f32 / 255.0;
      }
    }
    Ok(frame)
  }

  /// 先转为浮点再做双线性缩放到 W×H
  ///
  /// 与先缩放 8 位图像相比少一次量化。
  pub fn from_rgb8_resized(image: &RgbImage) -> Result<Self, FrameError> {
    if image.width() == 0 || image.height() == 0 {
      return Err(FrameError::Empty);
    }

    let float: Rgb32FImage = DynamicImage::ImageRgb8(image.clone()).into_rgb32f();
    let resized = image::imageops::resize(&float, W, H, FilterType::Triangle);

    let mut frame = Self::default();
    let plane = W as usize * H as usize;
    for (x, y, pixel) in resized.enumerate_pixels() {
      let idx = y as usize * W as usize + x as usize;
      for c in 0..RGB_CHANNELS {
        frame.data[c * plane + idx] = pixel[c];
      }
    }
    Ok(frame)
  }

  pub fn into_array(self) -> Result<Array4<f32>, FrameError> {
    let array = Array4::from_shape_vec(
      (1, RGB_CHANNELS, H as usize, W as usize),
      self.data.into_vec(),
    )?;
    Ok(array)
  }
}

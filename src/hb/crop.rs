// 该文件是 Prima AI 项目的一部分。
// src/hb/crop.rs - 由标签记录裁剪区域
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

use image::{RgbImage, imageops};

use crate::output::label_file::LabelRecord;

/// 像素坐标的半开区间 `[x1, x2) × [y1, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
  pub x1: u32,
  pub y1: u32,
  pub x2: u32,
  pub y2: u32,
}

impl CropBounds {
  /// 比例坐标乘以图像尺寸后向零截断，再限制在图像范围内
  pub fn from_record(record: &LabelRecord, width: u32, height: u32) -> Self {
    let to_pixel = |fraction: f64, extent: u32| -> u32 {
      ((fraction * extent as f64).trunc()).clamp(0.0, extent as f64) as u32
    };

    let half_w = record.width / 2.0;
    let half_h = record.height / 2.0;
    Self {
      x1: to_pixel(record.x_center - half_w, width),
      y1: to_pixel(record.y_center - half_h, height),
      x2: to_pixel(record.x_center + half_w, width),
      y2: to_pixel(record.y_center + half_h, height),
    }
  }

  pub fn width(&self) -> u32 {
    self.x2.saturating_sub(self.x1)
  }

  pub fn height(&self) -> u32 {
    self.y2.saturating_sub(self.y1)
  }

  pub fn is_empty(&self) -> bool {
    self.width() == 0 || self.height() == 0
  }

  /// 空区域返回 `None`
  pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
    if self.is_empty() {
      return None;
    }
    Some(imageops::crop_imm(image, self.x1, self.y1, self.width(), self.height()).to_image())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn record(x_center: f64, y_center: f64, width: f64, height: f64) -> LabelRecord {
    LabelRecord {
      class_id: 0,
      x_center,
      y_center,
      width,
      height,
    }
  }

  #[test]
  fn truncates_fractional_pixels() {
    let bounds = CropBounds::from_record(&record(0.5, 0.5, 0.25, 0.5), 101, 51);
    // 0.375 * 101 = 37.875, 0.625 * 101 = 63.125, 0.25 * 51 = 12.75, 0.75 * 51 = 38.25
    assert_eq!(
      bounds,
      CropBounds {
        x1: 37,
        y1: 12,
        x2: 63,
        y2: 38
      }
    );
  }

  #[test]
  fn clamps_boxes_leaving_the_image() {
    let bounds = CropBounds::from_record(&record(0.05, 0.95, 0.2, 0.2), 100, 100);
    assert_eq!(bounds.x1, 0);
    assert_eq!(bounds.y2, 100);
    assert!(!bounds.is_empty());
  }

  #[test]
  fn zero_sized_box_yields_no_crop() {
    let image = RgbImage::new(10, 10);
    let bounds = CropBounds::from_record(&record(0.5, 0.5, 0.0, 0.4), 10, 10);
    assert!(bounds.is_empty());
    assert!(bounds.crop(&image).is_none());
  }

  #[test]
  fn crop_copies_pixels() {
    let mut image = RgbImage::new(4, 4);
    image.put_pixel(2, 1, Rgb([200, 100, 50]));
    let bounds = CropBounds {
      x1: 2,
      y1: 1,
      x2: 4,
      y2: 3,
    };

    let crop = bounds.crop(&image).unwrap();
    assert_eq!(crop.dimensions(), (2, 2));
    assert_eq!(crop.get_pixel(0, 0), &Rgb([200, 100, 50]));
  }
}

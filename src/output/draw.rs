// 该文件是 Prima AI 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::info;

use crate::model::{DetectItem, DetectResult, WithLabel};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_THICKNESS: i32 = 2;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("读取字体文件失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 边框按类别着色，配置字体时在框上方绘制 `名称 分数` 标签
pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  palette: Vec<[u8; 3]>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      palette: vec![
        [0, 0, 255],   // 指甲床
        [255, 56, 56], // 其它部位
        [255, 157, 151],
        [255, 112, 31],
        [72, 249, 10],
        [0, 194, 255],
      ],
    }
  }
}

impl Draw {
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  pub fn with_font_file(self, path: &Path) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data)?;
    info!("加载标签字体: {}", path.display());
    Ok(self.with_font(font))
  }

  fn color_of(&self, class_id: u32) -> [u8; 3] {
    self.palette[class_id as usize % self.palette.len()]
  }

  pub fn draw_detections<T: WithLabel>(&self, image: &mut RgbImage, result: &DetectResult<T>) {
    for DetectItem { kind, score, bbox } in result.items.iter() {
      self.draw_bbox_with_label(image, bbox, kind, *score);
    }
  }

  // bbox 为归一化坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox_with_label<T: WithLabel>(
    &self,
    image: &mut RgbImage,
    bbox: &[f32; 4],
    kind: &T,
    score: f32,
  ) {
    if image.width() == 0 || image.height() == 0 {
      return;
    }
    let (w, h) = (image.width() as i32, image.height() as i32);

    let x_min = ((bbox[0] * w as f32).floor() as i32).clamp(0, w - 1);
    let y_min = ((bbox[1] * h as f32).floor() as i32).clamp(0, h - 1);
    let x_max = ((bbox[2] * w as f32).ceil() as i32).clamp(0, w - 1);
    let y_max = ((bbox[3] * h as f32).ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    let color = Rgb(self.color_of(kind.to_label_id()));
    for thickness in 0..BOX_THICKNESS {
      let width = x_max - x_min + 1 - 2 * thickness;
      let height = y_max - y_min + 1 - 2 * thickness;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect =
        Rect::at(x_min + thickness, y_min + thickness).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    let Some(font) = &self.font else {
      return;
    };

    let label = format!("{} {:.2}", kind.to_label_str(), score);
    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let label_x = x_min;
    let label_y = (y_min - self.label_text_height).max(0);
    let label_width = text_width.min(w - label_x).max(0) as u32;
    let label_height = self.label_text_height as u32;

    if label_width > 0 && label_height > 0 {
      let rect = Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, color);
      draw_text_mut(
        image,
        Rgb([255u8, 255u8, 255u8]),
        label_x,
        label_y + self.label_text_vertical_padding,
        PxScale::from(self.font_size),
        font,
        &label,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BodySiteLabel;

  fn result(items: Vec<DetectItem<BodySiteLabel>>) -> DetectResult<BodySiteLabel> {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }

  #[test]
  fn draws_box_outline_in_class_color() {
    let mut image = RgbImage::new(100, 100);
    let detections = result(vec![DetectItem {
      kind: BodySiteLabel::Nail,
      score: 0.9,
      bbox: [0.1, 0.2, 0.5, 0.6],
    }]);

    Draw::default().draw_detections(&mut image, &detections);

    assert_eq!(image.get_pixel(10, 20), &Rgb([0, 0, 255]));
    assert_eq!(image.get_pixel(50, 40), &Rgb([0, 0, 255]));
    assert_eq!(image.get_pixel(30, 40), &Rgb([0, 0, 0]));
  }

  #[test]
  fn degenerate_box_is_not_drawn() {
    let mut image = RgbImage::new(20, 20);
    let detections = result(vec![DetectItem {
      kind: BodySiteLabel::Other(1),
      score: 0.5,
      bbox: [0.5, 0.5, 0.5, 0.5],
    }]);

    Draw::default().draw_detections(&mut image, &detections);

    assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
  }

  #[test]
  fn invalid_font_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("font.ttf");
    std::fs::write(&path, b"not a font").unwrap();

    assert!(matches!(
      Draw::default().with_font_file(&path),
      Err(DrawError::InvalidFont(_))
    ));
  }
}

// 该文件是 Prima AI 项目的一部分。
// src/output/label_file.rs - YOLO 标签文件读写
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

//! 每行一个目标：`cls x_center y_center width height`，坐标为相对图像尺寸的比例。

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::model::{DetectItem, WithLabel};

#[derive(Error, Debug)]
pub enum LabelFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件第 {line} 行格式错误: '{content}'")]
  Malformed { line: usize, content: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRecord {
  /// 按原样保留，负数同样视为普通类别
  pub class_id: i64,
  pub x_center: f64,
  pub y_center: f64,
  pub width: f64,
  pub height: f64,
}

impl LabelRecord {
  pub fn from_item<T: WithLabel>(item: &DetectItem<T>) -> Self {
    let [x_center, y_center, width, height] = item.xywh();
    Self {
      class_id: i64::from(item.kind.to_label_id()),
      x_center: x_center as f64,
      y_center: y_center as f64,
      width: width as f64,
      height: height as f64,
    }
  }

  pub fn has_class(&self, class_id: u32) -> bool {
    self.class_id == i64::from(class_id)
  }

  pub fn to_line(&self) -> String {
    format!(
      "{} {} {} {} {}",
      self.class_id,
      format_coord(self.x_center),
      format_coord(self.y_center),
      format_coord(self.width),
      format_coord(self.height)
    )
  }

  /// 空行返回 `None`
  ///
  /// 类别列允许写成浮点数（如 `0.0`），按截断取整。
  pub fn parse_line(line: &str, line_number: usize) -> Result<Option<Self>, LabelFileError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
      return Ok(None);
    }

    let malformed = || LabelFileError::Malformed {
      line: line_number,
      content: trimmed.to_string(),
    };

    let values = trimmed
      .split_whitespace()
      .map(|part| part.parse::<f64>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| malformed())?;
    if values.len() < 5 || !values[0].is_finite() {
      return Err(malformed());
    }

    Ok(Some(Self {
      class_id: values[0].trunc() as i64,
      x_center: values[1],
      y_center: values[2],
      width: values[3],
      height: values[4],
    }))
  }
}

fn format_coord(value: f64) -> String {
  let text = format!("{:.6}", value);
  let text = text.trim_end_matches('0').trim_end_matches('.');
  match text {
    "" | "-" | "-0" => "0".to_string(),
    other => other.to_string(),
  }
}

/// 覆盖写入标签文件
pub fn write_label_file(path: &Path, records: &[LabelRecord]) -> Result<(), LabelFileError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  let mut content = records
    .iter()
    .map(LabelRecord::to_line)
    .collect::<Vec<_>>()
    .join("\n");
  content.push('\n');
  std::fs::write(path, content)?;
  debug!("写入标签文件 {} ({} 行)", path.display(), records.len());
  Ok(())
}

/// 读取标签文件，文件不存在视为没有记录
pub fn read_label_file(path: &Path) -> Result<Vec<LabelRecord>, LabelFileError> {
  let content = match std::fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      debug!("标签文件不存在: {}", path.display());
      return Ok(Vec::new());
    }
    Err(e) => return Err(e.into()),
  };

  let mut records = Vec::new();
  for (idx, line) in content.lines().enumerate() {
    if let Some(record) = LabelRecord::parse_line(line, idx + 1)? {
      records.push(record);
    }
  }
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BodySiteLabel;

  #[test]
  fn parses_yolo_line() {
    let record = LabelRecord::parse_line("0 0.5 0.25 0.1 0.2", 1)
      .unwrap()
      .unwrap();
    assert_eq!(
      record,
      LabelRecord {
        class_id: 0,
        x_center: 0.5,
        y_center: 0.25,
        width: 0.1,
        height: 0.2
      }
    );
  }

  #[test]
  fn float_class_column_is_truncated() {
    let record = LabelRecord::parse_line("1.0 0.5 0.5 0.1 0.1", 1)
      .unwrap()
      .unwrap();
    assert_eq!(record.class_id, 1);
  }

  #[test]
  fn negative_class_is_kept_as_other_class() {
    let record = LabelRecord::parse_line("-1 0.5 0.5 0.1 0.1", 2)
      .unwrap()
      .unwrap();
    assert_eq!(record.class_id, -1);
    assert!(!record.has_class(0));
  }

  #[test]
  fn blank_lines_are_skipped_and_garbage_rejected() {
    assert_eq!(LabelRecord::parse_line("   ", 3).unwrap(), None);
    assert!(matches!(
      LabelRecord::parse_line("0 0.5 0.5", 4),
      Err(LabelFileError::Malformed { line: 4, .. })
    ));
    assert!(LabelRecord::parse_line("nail 0.5 0.5 0.1 0.1", 5).is_err());
  }

  #[test]
  fn writes_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels").join("hand.txt");
    let item = DetectItem {
      kind: BodySiteLabel::Other(2),
      score: 0.8,
      bbox: [0.25, 0.5, 0.75, 1.0],
    };
    let records = vec![LabelRecord::from_item(&item)];
    write_label_file(&path, &records).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "2 0.5 0.75 0.5 0.5\n");
    assert_eq!(read_label_file(&path).unwrap(), records);
  }

  #[test]
  fn missing_file_has_no_records() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_label_file(&dir.path().join("none.txt")).unwrap().is_empty());
  }

  #[test]
  fn coordinates_drop_trailing_zeros() {
    assert_eq!(format_coord(0.5), "0.5");
    assert_eq!(format_coord(0.0), "0");
    assert_eq!(format_coord(1.0), "1");
    assert_eq!(format_coord(0.1234567), "0.123457");
  }
}

// 该文件是 Prima AI 项目的一部分。
// src/model/nail_regressor.rs - 指甲床 Hb 回归模型
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

use std::path::PathBuf;

use ort::{session::Session, value::Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
  frame::{FrameError, RgbNchwFrame},
  model::{Model, open_session},
};

pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

/// 回归模型输入帧 `[1, 3, 64, 64]`
pub type ClassifierFrame = RgbNchwFrame<CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE>;

#[derive(Error, Debug)]
pub enum RegressorError {
  #[error("模型文件不存在: {}", .0.display())]
  ModelNotFound(PathBuf),
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("模型输出应为单个标量, 实际 {0} 个值")]
  NotScalar(usize),
  #[error("输入帧错误: {0}")]
  FrameError(#[from] FrameError),
}

/// 两层卷积加两层全连接的小型 CNN，输出单个标量（g/L）
///
/// 网络结构固定为 conv(3→32)-pool-conv(32→64)-pool-fc(16384→128)-fc(128→1)，
/// 权重来自导出的 ONNX 文件。
pub struct NailHbRegressor {
  session: Session,
}

impl NailHbRegressor {
  pub fn load(model_path: impl Into<PathBuf>) -> Result<Self, RegressorError> {
    let model_path = model_path.into();
    if !model_path.is_file() {
      error!("回归模型不存在: {}", model_path.display());
      return Err(RegressorError::ModelNotFound(model_path));
    }

    let session = open_session(&model_path).map_err(RegressorError::ModelLoadError)?;
    Ok(Self { session })
  }
}

impl Model for NailHbRegressor {
  type Input = ClassifierFrame;
  type Output = f32;
  type Error = RegressorError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let tensor = Value::from_array(input.clone().into_array()?)?;
    let outputs = self.session.run(ort::inputs![tensor])?;
    let output = outputs[0].try_extract_array::<f32>()?;

    let value = match output.iter().next() {
      Some(&value) if output.len() == 1 => value,
      _ => return Err(RegressorError::NotScalar(output.len())),
    };
    debug!("回归模型输出: {}", value);
    Ok(value)
  }
}

// 该文件是 Prima AI 项目的一部分。
// src/task.rs - 任务执行
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

use tracing::info;

use crate::{model::Model, output::Render};

pub trait Task<F, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, frame: &F, model: M, output: &O) -> Result<Self::Output, Self::Error>;
}

/// 单帧推理并渲染，返回推理结果供后续处理
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<F, M, O> for OneShotTask
{
  type Output = D;
  type Error = anyhow::Error;

  fn run_task(self, frame: &F, mut model: M, output: &O) -> Result<D, Self::Error> {
    info!("开始推理...");
    let now = std::time::Instant::now();
    let result = model.infer(frame)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}

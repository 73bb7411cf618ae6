// 该文件是 Prima AI 项目的一部分。
// src/bin/hb_processor.rs - Hb 估计入口
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

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};

use prima_ai::{
  args::{HB_MISSING_ARGS, HbArgs, parse_or_report},
  config::{HbConfig, default_base_dir},
  hb::HbProcessor,
  report::{ErrorReport, emit},
  utils::init_tracing,
};

fn load_config(args: &HbArgs) -> Result<HbConfig> {
  let base_dir = match &args.base_dir {
    Some(dir) => dir.clone(),
    None => default_base_dir().context("无法确定基准目录")?,
  };
  info!("基准目录: {}", base_dir.display());
  Ok(args.to_config(&base_dir))
}

fn main() -> ExitCode {
  init_tracing();

  let args: HbArgs = match parse_or_report(HB_MISSING_ARGS) {
    Ok(args) => args,
    Err(code) => return code,
  };

  let config = match load_config(&args) {
    Ok(config) => config,
    Err(e) => {
      error!("{:#}", e);
      emit(&ErrorReport::new(format!(
        "An unexpected error occurred in hb processor: {:#}",
        e
      )));
      return ExitCode::FAILURE;
    }
  };

  info!("源图像: {}", args.image_path.display());
  match HbProcessor::new(config).run(&args.image_path) {
    Ok(report) => {
      emit(&report);
      ExitCode::SUCCESS
    }
    Err(e) => {
      error!("处理失败: {}", e);
      emit(&e.to_report());
      ExitCode::FAILURE
    }
  }
}

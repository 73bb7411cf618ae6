// 该文件是 Prima AI 项目的一部分。
// src/bin/diary_analyzer.rs - 日记视频分析入口
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

use tracing::{info, warn};

use prima_ai::{
  args::{DIARY_MISSING_ARGS, DiaryArgs, parse_or_report},
  diary::DiaryAnalyzer,
  report::emit,
  utils::init_tracing,
};

fn main() -> ExitCode {
  init_tracing();

  let args: DiaryArgs = match parse_or_report(DIARY_MISSING_ARGS) {
    Ok(args) => args,
    Err(code) => return code,
  };

  info!("视频文件: {}", args.video_path.display());
  let config = args.to_config();
  info!("接口地址: {}", config.endpoint);

  let result = DiaryAnalyzer::new(config)
    .and_then(|analyzer| analyzer.analyze(&args.video_path, &args.api_key));

  // 分析失败同样以 0 退出，错误放在 JSON 里
  match result {
    Ok(value) => emit(&value),
    Err(e) => {
      warn!("分析失败: {}", e);
      emit(&e.to_report());
    }
  }

  ExitCode::SUCCESS
}

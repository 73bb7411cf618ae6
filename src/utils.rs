// 该文件是 Prima AI 项目的一部分。
// src/utils.rs - 通用工具
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

use tracing_subscriber::EnvFilter;

/// 初始化日志，输出到 stderr
///
/// stdout 只用于输出 JSON 结果。未设置 `RUST_LOG` 时只打印警告及以上。
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .try_init();
}

/// 保留 `digits` 位小数，恰好落在中点时取偶数（银行家舍入）
pub fn round_to(value: f64, digits: i32) -> f64 {
  let factor = 10f64.powi(digits);
  (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
  use super::round_to;

  #[test]
  fn rounds_to_one_decimal() {
    assert_eq!(round_to(12.34, 1), 12.3);
    assert_eq!(round_to(12.36, 1), 12.4);
    assert_eq!(round_to(100.0, 1), 100.0);
    assert_eq!(round_to(0.0, 1), 0.0);
  }

  #[test]
  fn ties_round_to_even() {
    assert_eq!(round_to(12.25, 1), 12.2);
    assert_eq!(round_to(12.75, 1), 12.8);
    assert_eq!(round_to(96.25, 1), 96.2);
  }
}

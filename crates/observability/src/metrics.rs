//! None-stream 指标收集模块
//!
//! 指标名统一使用 `none_stream_` 前缀，按 stream 打标签。

use metrics::{counter, gauge};
use std::collections::BTreeMap;

/// 记录注册结果 (`bound` / `replaced` / `disabled`)
///
/// 只有 `bound` 会增加 worker 数；`replaced` 替换已有绑定，数量不变。
pub fn record_registration(stream: &str, outcome: &str) {
    counter!(
        "none_stream_registrations_total",
        "stream" => stream.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    if outcome == "bound" {
        gauge!("none_stream_bound_workers").increment(1.0);
    }
}

/// 记录已路由的记录
pub fn record_dispatched(stream: &str) {
    counter!("none_stream_records_dispatched_total", "stream" => stream.to_string()).increment(1);
}

/// 记录未找到 worker 的记录 (未注册或已禁用)
pub fn record_unrouted(kind: &str) {
    counter!("none_stream_records_unrouted_total", "kind" => kind.to_string()).increment(1);
}

/// 记录 intake 队列拒收
pub fn record_intake_dropped(stream: &str) {
    counter!("none_stream_intake_dropped_total", "stream" => stream.to_string()).increment(1);
}

/// 记录写入结果
pub fn record_write(stream: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "none_stream_writes_total",
        "stream" => stream.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录 TTL 删除行数
pub fn record_expired(stream: &str, rows: u64) {
    counter!("none_stream_rows_expired_total", "stream" => stream.to_string()).increment(rows);
}

/// 导入过程聚合统计
///
/// 在内存中聚合，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// 读取的输入行数
    pub lines_read: u64,
    /// 解析失败的行数
    pub parse_errors: u64,
    /// 已路由的记录数
    pub dispatched: u64,
    /// 无 worker 的记录数
    pub unrouted: u64,
    /// 各 kind 已路由计数
    pub per_kind: BTreeMap<String, u64>,
}

impl IngestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次分发结果
    pub fn update(&mut self, kind: &str, routed: bool) {
        if routed {
            self.dispatched += 1;
            *self.per_kind.entry(kind.to_string()).or_insert(0) += 1;
        } else {
            self.unrouted += 1;
        }
    }

    /// 路由比例 (百分比)
    pub fn routed_rate(&self) -> f64 {
        let total = self.dispatched + self.unrouted;
        if total > 0 {
            self.dispatched as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

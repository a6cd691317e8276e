//! Scene pacing 指标收集模块
//!
//! 记录场景准备请求、完成定时器和节拍循环的运行指标。

use metrics::{counter, gauge, histogram};

/// 记录一次 `begin_setup` 请求
///
/// `accepted = false` 表示重复或过期的帧号被忽略。
pub fn record_setup_request(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "ignored" };
    counter!(
        "scene_pacer_setup_requests_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录场景准备完成 (从请求到定时器触发的延迟)
pub fn record_setup_completed(latency_ms: f64) {
    counter!("scene_pacer_setup_completions_total").increment(1);
    histogram!("scene_pacer_setup_latency_ms").record(latency_ms);
}

/// 记录被取消的完成定时器
pub fn record_timer_cancelled() {
    counter!("scene_pacer_timers_cancelled_total").increment(1);
}

/// 记录节拍循环某一阶段的等待时间
///
/// `stage`: "image" 或 "setup"
pub fn record_cycle_wait(stage: &'static str, wait_ms: f64) {
    histogram!(
        "scene_pacer_cycle_wait_ms",
        "stage" => stage
    )
    .record(wait_ms);
}

/// 记录完成的触发周期
pub fn record_cycle_completed(mode: &'static str) {
    counter!(
        "scene_pacer_cycles_total",
        "mode" => mode
    )
    .increment(1);
}

/// 记录一次运行的平均周期速率 (cycles/sec)
pub fn record_run_rate(mode: &'static str, rate: f64) {
    gauge!(
        "scene_pacer_cycle_rate",
        "mode" => mode
    )
    .set(rate);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

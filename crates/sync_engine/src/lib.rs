//! # Sync Engine
//!
//! Scene setup synchronization for trigger-paced acquisition.
//!
//! 负责：
//! - 按帧号去重的场景准备请求 (`begin_setup`)
//! - 阻塞等待场景准备完成，每次完成只被消费一次 (`wait_completion`)
//! - 可取消的一次性完成定时器
//! - 图像接收信号
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{FrameId, SceneSyncConfig, SceneSynchronizer};
//!
//! let sync = SceneSynchronizer::new(SceneSyncConfig::default());
//!
//! // Event threads request setup for the next frame
//! sync.begin_setup(FrameId(1));
//!
//! // The pacing thread waits before triggering
//! sync.wait_completion();
//! ```

mod signal;
mod synchronizer;
mod timer;

pub use signal::ImageReceivedSignal;
pub use synchronizer::{SceneSynchronizer, SynchronizerStats};
pub use timer::{
    CompletionTimer, ManualTimerScheduler, ThreadTimerScheduler, TimerCallback, TimerFuse,
    TimerScheduler,
};

// Re-export contracts types
pub use contracts::{FrameId, SceneSyncConfig, SetupRequest, WaitOutcome};

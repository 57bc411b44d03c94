//! # QMS语音播报模块
//!
//! 候诊大厅叫号播报：按固定路径约定组装语音片段序列，
//! 通过FIFO队列逐条播放，保证播报互不交叠。

pub mod announcer;
pub mod clips;

pub use announcer::{Announcer, AudioSink, TracingSink};
pub use clips::{AudioClip, ClipLibrary};

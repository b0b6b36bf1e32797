//! Pipeline thread.
//!
//! A pipeline object renders one frame per iteration and exposes tunable
//! fields. The runner owns the loop; the presentation thread only sees the
//! frame queue and the field registry.
//!
//! # Architecture
//!
//! ```text
//! [FrameSource] ──produce──► [FrameQueue] ──poll──► presentation
//!       ▲                                              │
//!       └──── refresh_all ◄── [FieldRegistry] ◄──apply_edit
//! ```

pub mod gradient;
pub mod runner;

pub use gradient::{gradient_fields, GradientPipeline, DIRECTIONS};
pub use runner::{FrameSource, PipelineHandle, PipelineRunner, RunSummary};

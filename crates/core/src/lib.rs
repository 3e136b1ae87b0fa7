// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Core types shared by the change-stream fetch task.
//!
//! This crate holds the data model (positions, stream ranges, events), the
//! error taxonomy and the narrow contracts of the collaborators the fetch
//! task talks to:
//! - [`LogEngine`]: the external log-mining engine
//! - [`EventSink`]: receives change events and watermark markers
//! - [`ErrorReporter`]: receives fatal errors that abort the pipeline

pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod position;
pub mod range;
pub mod reporter;
pub mod sink;

pub use context::{RunContext, RunContextKind, StopReason};
pub use engine::{LogEngine, PositionObserver, SourceIdentity};
pub use error::{DispatchError, EngineError, FetchError, Result};
pub use event::{ChangeEvent, ChangeOp, SourceRecord, WatermarkEvent, WatermarkKind};
pub use position::Position;
pub use range::{EndPosition, NO_STOPPING, SplitId, StreamRange};
pub use reporter::ErrorReporter;
pub use sink::EventSink;

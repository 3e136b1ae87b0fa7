// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change-stream fetch task.
//!
//! A [`FetchTask`] reads one [`StreamRange`](cdcfetch_core::StreamRange)
//! of a change log through an external [`LogEngine`](cdcfetch_core::LogEngine).
//! Bounded ranges stop on their own once the log reaches the range's end
//! and emit an END watermark; unbounded ranges run until closed.
//! [`StreamFetcher`] drives a task on its own thread and buffers the
//! records it produces.

mod adapter;
mod config;
mod fetcher;
mod reporter;
mod sink;
mod task;

pub use adapter::LogEngineAdapter;
pub use config::FetchConfig;
pub use fetcher::StreamFetcher;
pub use reporter::SharedErrorReporter;
pub use sink::ChannelEventSink;
pub use task::{FetchTask, FetchTaskContext, TaskState};

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::VecDeque,
	sync::atomic::{AtomicU64, AtomicUsize, Ordering},
	thread,
	time::Duration,
};

use cdcfetch_core::{
	ChangeEvent, LogEngine, Position, PositionObserver, RunContext, SourceIdentity, error::EngineError,
};
use parking_lot::Mutex;
use tracing::debug;

/// One action of a scripted engine.
#[derive(Debug, Clone)]
pub enum Step {
	/// Hand a decoded change event to the observer.
	Change(ChangeEvent),
	/// Report that the engine's position moved.
	Advance(Position),
	/// Fail the execution with an engine error.
	Fail(String),
	/// Nothing to read; wait one poll interval.
	Idle,
	/// Block without polling the run context, then carry out the next step.
	Stall(Duration),
	/// Panic inside the engine.
	Panic(String),
}

type Generator = Box<dyn Fn(u64) -> Vec<Step> + Send + Sync>;

/// Log engine replaying a script of steps.
///
/// Once the script runs dry the engine either asks its generator for the
/// next round of steps or idles until the run context stops, like a miner
/// waiting for new redo entries.
#[derive(Default)]
pub struct ScriptedEngine {
	steps: Mutex<VecDeque<Step>>,
	generator: Option<Generator>,
	rounds: AtomicU64,
	executions: AtomicUsize,
	advances: AtomicUsize,
	stalls: AtomicUsize,
	starts: Mutex<Vec<Position>>,
}

impl ScriptedEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_steps(steps: impl IntoIterator<Item = Step>) -> Self {
		let engine = Self::new();
		engine.steps.lock().extend(steps);
		engine
	}

	/// Engine producing steps forever; `generator` receives the round number.
	pub fn generating<F>(generator: F) -> Self
	where
		F: Fn(u64) -> Vec<Step> + Send + Sync + 'static,
	{
		Self {
			generator: Some(Box::new(generator)),
			..Self::default()
		}
	}

	/// Appends a step, also while the engine is executing.
	pub fn push(&self, step: Step) {
		self.steps.lock().push_back(step);
	}

	pub fn executions(&self) -> usize {
		self.executions.load(Ordering::SeqCst)
	}

	/// Number of position advances reported to an observer.
	pub fn advances(&self) -> usize {
		self.advances.load(Ordering::SeqCst)
	}

	/// Number of stalls entered.
	pub fn stalls(&self) -> usize {
		self.stalls.load(Ordering::SeqCst)
	}

	/// Start positions of every execution.
	pub fn starts(&self) -> Vec<Position> {
		self.starts.lock().clone()
	}

	fn next_step(&self) -> Option<Step> {
		let mut steps = self.steps.lock();
		if steps.is_empty() {
			if let Some(generator) = &self.generator {
				let round = self.rounds.fetch_add(1, Ordering::SeqCst);
				steps.extend(generator(round));
			}
		}
		steps.pop_front()
	}
}

impl LogEngine for ScriptedEngine {
	fn execute(
		&self,
		run: &RunContext,
		source: &SourceIdentity,
		start: &Position,
		observer: &dyn PositionObserver,
	) -> Result<(), EngineError> {
		self.executions.fetch_add(1, Ordering::SeqCst);
		self.starts.lock().push(start.clone());
		debug!(source = %source.name, %start, "scripted engine started");

		while run.is_running() {
			let mut step = self.next_step();
			while let Some(Step::Stall(duration)) = step {
				self.stalls.fetch_add(1, Ordering::SeqCst);
				thread::sleep(duration);
				step = self.next_step();
			}

			match step {
				Some(Step::Change(event)) => observer.on_change_event(event),
				Some(Step::Advance(position)) => {
					self.advances.fetch_add(1, Ordering::SeqCst);
					observer.after_position_advance(&position);
				}
				Some(Step::Fail(message)) => return Err(EngineError::Failed(message)),
				Some(Step::Panic(message)) => panic!("{}", message),
				Some(Step::Idle) | Some(Step::Stall(_)) | None => run.idle(),
			}
		}

		debug!(source = %source.name, reason = ?run.stop_reason(), "scripted engine stopped");
		Ok(())
	}
}

use tracing::debug;

use crate::config::Config;
use crate::job;
use crate::signal::SignalController;

pub struct State {
	pub config: Config,
	pub jobs: job::JobRegistry,
	pub signals: SignalController,
}

impl State {
	pub fn new(config: Config, signals: SignalController) -> State {
		let jobs = job::JobRegistry::new(config.max_background);
		State { config, jobs, signals }
	}

	/// Moves every background child reaped since the last call into the
	/// finished list. Foreground pipelines do their own settling while they
	/// wait, so no foreground child can be pending here.
	pub fn settle_background(&mut self) -> crate::errors::Result<()> {
		let mut nobody = job::ForegroundGroup::new();
		self.signals.block()?;
		let jobs = &mut self.jobs;
		self.signals.drain(|pid, status| job::record_exit(jobs, &mut nobody, pid, status));
		self.signals.unblock()?;
		debug!(active = self.jobs.active_len(), finished = self.jobs.finished_len(), "background settled");
		Ok(())
	}
}

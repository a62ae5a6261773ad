//! Fixed pool of game-service targets.

use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::target::Target;

/// The ordered target set plus its shared round-robin cursor.
///
/// Built once from configuration; the set never changes while the process
/// runs. Shared across all inbound requests.
#[derive(Debug)]
pub struct TargetPool {
    targets: Vec<Arc<Target>>,
    selector: RoundRobin,
}

impl TargetPool {
    /// Build the pool from configured base URLs, one breaker per target.
    pub fn from_urls(
        urls: &[String],
        fail_max: u32,
        open_duration: Duration,
    ) -> Result<Self, url::ParseError> {
        let targets = urls
            .iter()
            .map(|url| Target::from_config(url, fail_max, open_duration).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            targets,
            selector: RoundRobin::new(),
        })
    }

    /// Target at the cursor position; the cursor advances every call.
    pub fn next(&self) -> Arc<Target> {
        let index = self.selector.next_index(self.targets.len());
        Arc::clone(&self.targets[index])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[Arc<Target>] {
        &self.targets
    }
}

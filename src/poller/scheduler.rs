use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};

use crate::tasks::{Task, TaskPriority, TaskSubmitter};

/// Submit a low priority tracker update now and then once every `period`.
pub async fn run(submitter: TaskSubmitter<Task>, period: Duration) {
    let mut interval = interval(period);

    info!(period_secs = period.as_secs(), "🔄 Match poll scheduler started");

    loop {
        interval.tick().await;
        debug!("🔄 Scheduling tracker update");
        submitter.submit(Task::tracker_update(TaskPriority::Low));
    }
}

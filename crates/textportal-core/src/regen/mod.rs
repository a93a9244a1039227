mod job;
mod scheduler;

pub use job::{RegenerationJob, RegenerationReport, Regenerator};
pub use scheduler::SchedulerService;

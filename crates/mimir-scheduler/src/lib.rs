//! Pipeline & Plugin Runtime scheduling: cron-driven job triggering
//! (`Scheduler`, §4.3) and in-flight execution tracking with cooperative
//! cancellation (`ExecutionMonitor`, §4.4).

pub mod cron;
pub mod errors;
pub mod execution_monitor;
pub mod scheduler;

pub use cron::CronSchedule;
pub use errors::SchedulerError;
pub use execution_monitor::{ExecutionMonitor, ExecutionStatistics};
pub use scheduler::Scheduler;

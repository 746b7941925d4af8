pub mod availability;
pub mod scheduler;

pub use availability::AvailabilityService;
pub use scheduler::MaintenanceScheduler;

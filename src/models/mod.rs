pub mod lesson;
pub mod rule;

pub use lesson::{Lesson, LessonStatus, NewLessonRequest, UpdateLessonStatusRequest};
pub use rule::{AvailabilityRule, AvailableSlot, NewRuleRequest, UpdateRuleRequest};

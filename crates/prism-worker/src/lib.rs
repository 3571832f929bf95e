//! Prism Worker Library
//!
//! The event-driven transformation pipeline: [`TransformationProcessor`]
//! splits each uploaded object into red, green and blue artifacts, the
//! [`handler`] turns storage notifications into invocation responses, and the
//! [`queue`] redelivers failed records the way an at-least-once notification
//! mechanism would.

pub mod handler;
pub mod processor;
pub mod queue;

pub use handler::{handle_event, handle_notification, InvocationResponse};
pub use processor::TransformationProcessor;
pub use queue::{DeliveryAttempt, DeliveryLog, NotificationQueue, NotificationQueueConfig};

//! Business logic services.

pub mod applications;
pub mod jobs;

pub use applications::ApplicationService;
pub use jobs::JobService;

#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod goal_service;
pub mod view;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, GoalServiceError};
pub use goal_service::GoalService;
pub use view::{Dashboard, GoalProgressView, GoalSnapshot};

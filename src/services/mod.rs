//! Service layer: engine logic invoked by routes and background jobs.

/// Pure team allocation decisions.
pub mod allocator;
/// OpenAPI document aggregation.
pub mod documentation;
/// Health endpoint logic.
pub mod health_service;
/// Match CRUD and lifecycle orchestration.
pub mod match_service;
/// Push gateway seam.
pub mod notifier;
/// Periodic reminder fan-out for matches and events.
pub mod reminder_scheduler;
/// Periodic bulk status advancement.
pub mod status_scheduler;
/// Storage backend supervision.
pub mod storage_supervisor;
/// Join/switch/leave orchestration.
pub mod subscription_service;

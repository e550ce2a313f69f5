//! Core business logic - framework-agnostic demand, session, feedback, lesson,
//! catalog and reporting operations, plus the authorization gate.

/// Authorization gate and role capability handles
pub mod access;
/// Art-type catalog and the variation rule
pub mod art_type;
/// Demand pricing, totals and persistence
pub mod demand;
/// Administrator feedback and its viewed state
pub mod feedback;
/// Lessons and per-designer progress
pub mod lesson;
/// Time windows, rollups and history rows
pub mod report;
/// Work sessions (clock-ins)
pub mod session;
/// The system settings singleton
pub mod settings;
/// Accounts and the active flag
pub mod user;
/// Viewed-state transition shared by feedback and lessons
pub mod viewed;

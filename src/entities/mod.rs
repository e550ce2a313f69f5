//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod art_type;
pub mod demand;
pub mod demand_item;
pub mod feedback;
pub mod feedback_image;
pub mod lesson;
pub mod lesson_progress;
pub mod system_settings;
pub mod user;
pub mod work_session;

// Re-export specific types to avoid conflicts
pub use art_type::{Column as ArtTypeColumn, Entity as ArtType, Model as ArtTypeModel};
pub use demand::{Column as DemandColumn, Entity as Demand, Model as DemandModel};
pub use demand_item::{Column as DemandItemColumn, Entity as DemandItem, Model as DemandItemModel};
pub use feedback::{Column as FeedbackColumn, Entity as Feedback, Model as FeedbackModel};
pub use feedback_image::{
    Column as FeedbackImageColumn, Entity as FeedbackImage, Model as FeedbackImageModel,
};
pub use lesson::{Column as LessonColumn, Entity as Lesson, Model as LessonModel};
pub use lesson_progress::{
    Column as LessonProgressColumn, Entity as LessonProgress, Model as LessonProgressModel,
};
pub use system_settings::{
    Column as SystemSettingsColumn, Entity as SystemSettings, Model as SystemSettingsModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
pub use work_session::{
    Column as WorkSessionColumn, Entity as WorkSession, Model as WorkSessionModel,
};

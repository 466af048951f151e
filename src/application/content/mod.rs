//! Content management services behind the admin listener.

mod categories;
mod posts;
mod types;

pub use categories::AdminCategoryService;
pub use posts::AdminPostService;
pub use types::{
    AdminContentError, CreateCategoryCommand, CreateHeadingCommand, CreatePostCommand,
    PostAnalyticsReport, UpdatePostCommand,
};

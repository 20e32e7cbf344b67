//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::{Comment, CommentView};
pub use location::Location;
pub use post::{Post, PostDraft, PostView, TITLE_MAX_LEN};
pub use user::{ProfileChanges, USERNAME_MAX_LEN, User};

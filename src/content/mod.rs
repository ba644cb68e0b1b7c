//! Content module - posts, front-matter and the markdown pipeline

mod frontmatter;
pub mod loader;
mod markdown;
mod post;
pub mod slugger;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::ContentStore;
pub use markdown::MarkdownRenderer;
pub use post::{sort_posts, Post, DEFAULT_CATEGORY};

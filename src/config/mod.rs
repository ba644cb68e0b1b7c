//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::MarkdownConfig;
pub use site::SiteConfig;
pub use site::{CONFIG_FILE, CONFIG_SNAPSHOT};

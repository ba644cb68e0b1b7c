//! Helper functions shared by the templates and request handlers

mod date;
mod html;
mod pagination;
mod url;

pub use date::*;
pub use html::*;
pub use pagination::*;
pub use url::*;

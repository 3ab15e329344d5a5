pub mod create;
pub mod list;
pub mod switch;

// Re-export handler functions for use in routing
pub use create::create_post;
pub use list::list_get;
pub use switch::switch_post;

pub mod login;
pub mod register;

// Re-export handler functions for use in routing
pub use login::login_post;
pub use register::register_post;

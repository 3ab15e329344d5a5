pub mod accept;

pub use accept::accept_post;

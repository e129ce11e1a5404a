// Public handlers (no authentication required)
pub mod register;

pub use register::register_post;

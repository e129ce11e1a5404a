// Protected handlers (staff JWT authentication required)
pub mod checkin;
pub mod reconcile;

pub use checkin::checkin_post;
pub use reconcile::reconcile_post;

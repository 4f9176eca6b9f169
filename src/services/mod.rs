pub mod availability;
pub mod lifecycle;
pub mod notifications;
pub mod slots;
pub mod statistics;

pub mod booking;
pub mod pitch;
pub mod slot;

pub use booking::{Booking, BookingStatus, ModificationStatus, StagedModification};
pub use pitch::{Pitch, PitchStatus, SportType};
pub use slot::TimeSlot;

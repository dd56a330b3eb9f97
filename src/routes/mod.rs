// Route module decomposition — each domain area in its own file.

mod lectures;
mod rooms;
mod socket;
mod system;

pub use lectures::{create_lecture, get_lecture, update_lecture_status};
pub use rooms::{create_room, get_room};
pub use socket::ws_connect;
pub use system::{health, not_found, stats, too_many_requests};

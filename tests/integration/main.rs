// HTTP-surface integration tests for the ambient admin API (room/lecture
// CRUD, health/stats). The real-time wire protocol (chat, moderation,
// signaling) is exercised at the unit level inside the hub's own room actor,
// since it has no HTTP representation to dispatch against here.

mod common;

mod lectures;
mod rooms;
mod system;

//! REST collaborator for room records and stored chat history.

pub mod rooms;

pub use rooms::RoomApiClient;

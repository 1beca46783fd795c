pub mod lifecycle;
pub mod outcome;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod view;

pub use outcome::{Action, Departure, PlayOutcome, Rejection, RosterError};
pub use protocol::{TrickPhase, TrickProtocol};
pub use registry::{JoinOutcome, LeaveOutcome, RoomError, RoomRegistry};
pub use room::{GameRoom, RoomId};
pub use view::{GameView, SeatView};

// Service exports
pub mod line;
pub mod places;
pub mod session;

pub use line::{compute_signature, verify_signature, LineClient, LineError, Messenger};
pub use places::{NearbyRequest, NearbySearch, PlacesClient, PlacesError};
pub use session::{Clock, ManualClock, MemorySessionStore, SessionError, SessionKey, SessionStore, SystemClock};

pub mod error;
pub mod events;
pub mod power_levels;
pub mod room_version;

pub use error::{EventError, RoomVersionError};
pub use events::{users_of, CreationEvent, PowerLevelsEvent, MAX_POWER_LEVEL, ROOM_CREATE, ROOM_POWER_LEVELS};
pub use power_levels::{synthesize, Synthesized};
pub use room_version::{RoomVersionDescriptor, RoomVersionRegistry, Stability, DEFAULT_ROOM_VERSION};

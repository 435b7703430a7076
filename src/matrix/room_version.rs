use std::collections::HashMap;

use super::error::RoomVersionError;
use super::events::CreationEvent;

/// Version assumed when a create event does not declare one.
pub const DEFAULT_ROOM_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable,
    Unstable,
}

/// Capabilities of a single room version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomVersionDescriptor {
    pub id: String,
    pub stability: Stability,
    /// Creators hold infinite power regardless of `m.room.power_levels`.
    pub privileged_creators: bool,
}

impl RoomVersionDescriptor {
    pub fn new(id: impl Into<String>, stability: Stability, privileged_creators: bool) -> Self {
        Self {
            id: id.into(),
            stability,
            privileged_creators,
        }
    }
}

/// Lookup table from room version identifier to its descriptor.
#[derive(Debug, Clone, Default)]
pub struct RoomVersionRegistry {
    versions: HashMap<String, RoomVersionDescriptor>,
}

impl RoomVersionRegistry {
    /// The room versions known to the proxy
    pub fn standard() -> Self {
        let stable = (1..=11).map(|v| RoomVersionDescriptor::new(v.to_string(), Stability::Stable, false));

        Self::default()
            .with_versions(stable)
            .with(RoomVersionDescriptor::new("12", Stability::Stable, true))
            .with(RoomVersionDescriptor::new("org.matrix.hydra.11", Stability::Unstable, true))
    }

    /// Add or replace a descriptor
    pub fn with(mut self, descriptor: RoomVersionDescriptor) -> Self {
        self.versions.insert(descriptor.id.clone(), descriptor);
        self
    }

    pub fn with_versions(self, descriptors: impl IntoIterator<Item = RoomVersionDescriptor>) -> Self {
        descriptors.into_iter().fold(self, Self::with)
    }

    pub fn get(&self, id: &str) -> Result<&RoomVersionDescriptor, RoomVersionError> {
        self.versions
            .get(id)
            .ok_or_else(|| RoomVersionError::UnknownVersion(id.to_string()))
    }

    /// Resolve the version declared by a create event, falling back to
    /// [`DEFAULT_ROOM_VERSION`]. An undeclared version never fails; an unknown
    /// declared one does.
    pub fn resolve(&self, create: &CreationEvent) -> Result<&RoomVersionDescriptor, RoomVersionError> {
        self.get(declared_version(create))
    }
}

pub fn declared_version(create: &CreationEvent) -> &str {
    create.room_version.as_deref().unwrap_or(DEFAULT_ROOM_VERSION)
}

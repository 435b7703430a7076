use serde_json::{Map, Value};

use super::error::EventError;
use super::events::{users_of, CreationEvent, PowerLevelsEvent, MAX_POWER_LEVEL};

/// Result of running a power levels event through [`synthesize`].
#[derive(Debug, Clone)]
pub enum Synthesized {
    /// Privileged creators do not apply; the event is passed through untouched.
    Unchanged(PowerLevelsEvent),
    /// The event document with `content.users` rewritten.
    Rewritten(Map<String, Value>),
}

impl Synthesized {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Synthesized::Rewritten(_))
    }
}

/// Give every creator of the room the maximum power level.
///
/// When `privileged_creators` is false the event is returned as-is. Otherwise
/// the sender of the create event and each `additional_creators` entry are set
/// to [`MAX_POWER_LEVEL`] in `content.users`, overwriting any explicit grant.
/// Nothing else in the document changes.
///
/// The create event's `additional_creators` and the power levels document are
/// only checked on the rewriting path; a pass-through never fails.
pub fn synthesize(
    create: &CreationEvent,
    power_levels: PowerLevelsEvent,
    privileged_creators: bool,
) -> Result<Synthesized, EventError> {
    if !privileged_creators {
        return Ok(Synthesized::Unchanged(power_levels));
    }

    let creators = create.creators()?;
    let mut document = power_levels.document()?;
    let mut users = users_of(&document)?;
    for creator in creators {
        tracing::info!("Adding creator '{}' to power levels", creator);
        users.insert(creator.to_string(), MAX_POWER_LEVEL);
    }

    match document.get_mut("content") {
        Some(Value::Object(content)) => {
            content.insert("users".to_string(), serde_json::to_value(users)?);
        }
        _ => return Err(EventError::MissingContent),
    }

    Ok(Synthesized::Rewritten(document))
}

use axum::body::Bytes;

use crate::matrix::{EventError, Synthesized};

/// Shape of a successful power levels response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    /// The whole event envelope (`?format=event`)
    Event,
    /// Only the `content` object
    #[default]
    Content,
}

impl OutputShape {
    /// Pick the shape from a raw query string. Only the first `format` pair
    /// counts; anything other than `event` means content-only.
    pub fn from_query(query: Option<&str>) -> Self {
        let format = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "format")
                .map(|(_, value)| value)
        });

        match format.as_deref() {
            Some("event") => OutputShape::Event,
            _ => OutputShape::Content,
        }
    }
}

/// Serialize a synthesized power levels event in the requested shape.
///
/// An unchanged event is returned byte-for-byte as fetched. Content-only output
/// still needs a `content` member to slice out, whatever its type.
pub fn render(synthesized: &Synthesized, shape: OutputShape) -> Result<Bytes, EventError> {
    match (synthesized, shape) {
        (Synthesized::Unchanged(event), OutputShape::Event) => Ok(event.raw().clone()),
        (Synthesized::Unchanged(event), OutputShape::Content) => {
            Ok(Bytes::copy_from_slice(event.raw_content()?.get().as_bytes()))
        }
        (Synthesized::Rewritten(document), OutputShape::Event) => Ok(Bytes::from(serde_json::to_vec(document)?)),
        (Synthesized::Rewritten(document), OutputShape::Content) => {
            let content = document.get("content").ok_or(EventError::MissingContent)?;
            Ok(Bytes::from(serde_json::to_vec(content)?))
        }
    }
}

/// Marker trait for intent objects.
///
/// Intents represent:
/// - User actions (start linking, cancel)
/// - Observations (a poll result, a failed request)
pub trait Intent: Send + 'static {}

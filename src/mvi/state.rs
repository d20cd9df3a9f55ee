/// Marker trait for state objects driven by a reducer.
///
/// States are cloned to produce new states and compared to detect changes.
pub trait ViewState: Clone + PartialEq + Default + Send + 'static {}

//! Reducer primitives for client-side state machines.
//!
//! ```text
//! Intent ──→ Reducer ──→ State
//!    ↑                     │
//!    └─────────────────────┘
//! ```
//!
//! - **State**: snapshot of what the client knows about a remote process
//! - **Intent**: a user action or an observation from the service
//! - **Reducer**: pure function producing the next state

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::ViewState;

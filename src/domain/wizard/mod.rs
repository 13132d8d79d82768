//! Step wizard domain module.
//!
//! A wizard is an ordered sequence of named steps with gated forward
//! transitions. This module holds the pure parts: the step contract, the
//! form field map, the per-action status machine, and the state a mounted
//! wizard exposes to its view. The async driver lives in
//! `application::wizard`.

mod fields;
mod notice;
mod state;
mod step;

pub use fields::FormFields;
pub use notice::{NoticeLevel, TransientNotice};
pub use state::{ActionStatus, WizardState};
pub use step::{is_reachable_step, reachable_steps, WizardStep};

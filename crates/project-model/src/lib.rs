//! Reelcut Project Model
//!
//! Defines the edit-decision-list (EDL) that Reelcut renders:
//! - **Clips:** in/out ranges of a source file with speed, gain and mute
//! - **Transitions:** cross-fades joining a clip to its predecessor
//! - **Tracks:** ordered lanes of clips, video or audio
//! - **Timeline:** pure edit operations over ordered clip lists
//! - **Settings:** the normalized encode contract handed to the compiler
//! - **Project:** the aggregate root, its persistence and snapshots
//!
//! Nothing in this crate touches source media. Every edit returns a new
//! clip list, so any state can be captured as an opaque snapshot.

pub mod clip;
mod lenient;
pub mod project;
pub mod settings;
pub mod timeline;
pub mod track;

pub use clip::*;
pub use project::*;
pub use settings::*;
pub use timeline::*;
pub use track::*;

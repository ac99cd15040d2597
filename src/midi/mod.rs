//! MIDI foot-pedal support — configuration, message mapping, and the
//! listener that bridges a pedal to the event loop.

pub mod config;
pub mod input;
pub mod mapping;

pub use config::PedalConfig;
pub use input::{PedalError, PedalInput};
pub use mapping::{apply_pedal_message, PedalMapping};

//! Stock inputs and outputs

mod channel_input;
mod line_input;
mod log_output;

pub use channel_input::ChannelInput;
pub use line_input::{parse_line, LineInput};
pub use log_output::LogOutput;

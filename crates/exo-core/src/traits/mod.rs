//! Host-side plugin contracts.
//!
//! - `input` - the lifecycle every input plugin exposes to the scheduler
//! - `accumulator` - the sink gathered metrics are pushed into
//!
//! External plugins satisfy [`Input`] through a bridge wrapper, so the
//! scheduler treats them exactly like in-process inputs.

mod accumulator;
mod input;

pub use accumulator::Accumulator;
pub use input::Input;

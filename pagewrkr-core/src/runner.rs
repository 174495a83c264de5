mod generator;
mod load;
mod pages;
mod progress;
mod signal;

pub use generator::LoadGenerator;
pub use load::{Jitter, LoadConfig};
pub use pages::{PageRange, PageStrategy, spec_factory};
pub use progress::{ProgressFn, ProgressUpdate};
pub use signal::StopSignal;

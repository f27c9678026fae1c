mod controller;
mod keyframe;
mod manager;
mod processor;
mod skeleton;
mod snapshot;

pub use controller::*;
pub use keyframe::*;
pub use manager::*;
pub use processor::*;
pub use skeleton::*;
pub use snapshot::*;

#[cfg(test)]
mod test_support;





#[cfg(test)]
mod processor_tests;

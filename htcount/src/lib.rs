//! Count how many reads of an alignment file overlap each feature of a
//! genome annotation, the way `htseq-count` does.
//!
//! Every part lives in its own crate and is re-exported here behind a cargo
//! feature of the same name; `counter` (the default) pulls in the rest.
#[cfg(feature = "core")]
#[doc(inline)]
pub use htcount_core as core;

#[cfg(feature = "overlaprs")]
#[doc(inline)]
pub use htcount_overlaprs as overlaprs;

#[cfg(feature = "io")]
#[doc(inline)]
pub use htcount_io as io;

#[cfg(feature = "counter")]
#[doc(inline)]
pub use htcount_counter as counter;

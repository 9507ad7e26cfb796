//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod guard;

pub(crate) use circular::detect_cycles;
pub(crate) use guard::catch_panics;

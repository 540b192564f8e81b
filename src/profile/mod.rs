//! Data profiling primitives for count matrix characteristics.

mod library_size;

pub use library_size::{profile_library_size, LibrarySizeProfile};

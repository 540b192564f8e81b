//! Statistical hypothesis testing.


pub use welch::{test_welch, welch_t, WelchResult, WelchResultSingle, WelchStats};

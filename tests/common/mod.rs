// tests/common/mod.rs

#![allow(dead_code, unused_imports)]

pub use hotserve_test_utils::*;

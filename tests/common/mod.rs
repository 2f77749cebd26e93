#![allow(dead_code)]

pub mod assertions;
pub mod helpers;

pub use assertions::*;
pub use helpers::*;

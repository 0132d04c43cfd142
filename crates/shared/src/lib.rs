//! Wire and domain types shared between the deposit client and its front ends.

pub mod domain;
pub mod error;
pub mod validation;

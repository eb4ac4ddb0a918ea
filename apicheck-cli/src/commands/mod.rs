//! Command implementations for the apicheck CLI

pub mod categories;
pub mod check;

//! tests/api/main.rs
mod algebra;
mod helpers;
mod pipeline;

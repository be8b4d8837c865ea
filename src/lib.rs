#![doc = include_str!("../README.md")]
#![warn(
    missing_docs,
    clippy::panic_in_result_fn,
    clippy::missing_assert_message,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

pub mod client;
pub mod error;
pub mod rpc;
pub mod transport;
pub mod value;

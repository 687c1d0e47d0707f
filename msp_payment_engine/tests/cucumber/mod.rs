mod msp_world;
mod setups;
mod steps;

pub use msp_world::{MspWorld, PaymentSystem};

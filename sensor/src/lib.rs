//! AHT20 temperature and humidity sensor driver.

pub mod aht20;

pub use aht20::{decode, Aht20, Aht20Error, AHT20_ADDRESS};

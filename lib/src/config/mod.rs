//! Configuration for infill generation.

mod fill_config;

pub use fill_config::{
    FillConfig, FillPattern, TooLongLinkPolicy, FULL_DENSITY, MIN_ANCHOR_LENGTH,
};

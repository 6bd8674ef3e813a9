pub mod layers;
pub mod logging;

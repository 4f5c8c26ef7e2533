//! Request handlers. Each returns a JSON body.

pub mod state;
pub mod util;
pub mod zones;

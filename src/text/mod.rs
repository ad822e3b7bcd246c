//! Text layer — canonical form and approximate matching.
//!
//! Every classifier rule and resolver score operates on normalized text so
//! accented, casual, and punctuated input is compared uniformly.

pub mod normalize;
pub mod similarity;

pub use normalize::normalize;
pub use similarity::{edit_distance, similarity, token_matches, token_near_match};

pub mod anchor;
pub mod detail;
pub mod fields;
pub mod listing;
pub mod locations;
pub mod tokens;

pub use detail::parse_trial_detail;
pub use listing::{parse_listing, total_count};

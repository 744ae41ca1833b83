pub mod feed;
pub mod geo;
pub mod rider;

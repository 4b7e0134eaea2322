// Push pipeline backends
// Rendering, host delivery and remote image fetching

pub mod delivery;
pub mod image_utils;
pub mod renderer;

pub use delivery::{DeliveryOutcome, DeliveryQueue};
pub use image_utils::ImageFetcher;
pub use renderer::{NotificationRenderer, RequestCodeAllocator};

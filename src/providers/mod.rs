//! # Calendar Providers
//!
//! Provider adapters fetch bounded windows of calendar events from external
//! calendar APIs and refresh OAuth credentials on demand. Providers are
//! looked up by slug through the [`registry::Registry`].

pub mod google;
pub mod registry;
pub mod trait_;

pub use google::GoogleCalendarProvider;
pub use registry::Registry;
pub use trait_::{
    CalendarProvider, EventPage, EventWindow, ProviderError, ProviderEvent, RefreshedTokens,
};

//! Listing collection access
//!
//! The rest of the crate talks to the bike listing collection only through the
//! [`ListingStore`] trait, which offers filter, sort and limit queries.

pub mod gateway;
pub mod listing;
pub mod memory;
pub mod timeout;

pub use gateway::{establish_store, ListingStore, StoreError, UnavailableListingStore};
pub use listing::{FieldRange, Listing, ListingFilter, SortSpec};
pub use memory::MemoryListingStore;
pub use timeout::TimeoutListingStore;

//! Atomic stock counter store.
//!
//! One counter per product holds the currently available stock. All
//! mutation goes through the atomic primitives of [`StockCounters`];
//! callers never read-then-write in two steps. A successful decrement is
//! a provisional reservation, released again by [`StockCounters::increment`]
//! when an order is canceled or a placement partially fails.

mod counter;
mod error;
mod memory;

pub use counter::StockCounters;
pub use error::{Result, StockError};
pub use memory::InMemoryStockCounters;

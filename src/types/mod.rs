//! Type definitions for the lottery client
//!
//! This module contains the domain data structures for ticket selection,
//! purchase outcomes, and normalized winning records.

pub mod outcome;
pub mod ticket;
pub mod winning;

pub use outcome::{AssignedSlot, PurchaseOutcome};
pub use ticket::{GameSlot, MAX_SLOTS, SLOT_LABELS, SLOT_PRICE_WON, TicketSelection};
pub use winning::{Ball, SelectionMethod, SlotLine, WinStatus, WinningCheck, WinningRecord};

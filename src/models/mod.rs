pub mod booking;
pub mod event;
pub mod price_history;
pub mod ticket;
pub mod tier;

/// CSV export of run history.
pub mod export;

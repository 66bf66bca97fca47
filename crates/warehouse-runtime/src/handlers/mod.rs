//! # Background Handlers

pub mod expiry;

pub use expiry::ExpirySweeper;

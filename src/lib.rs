//! Stagpark - campus parking occupancy tracker
//!
//! A small stateful ledger of vehicles entering and exiting category-based
//! parking lots, plus a read-only lookup service for static zone/lot data.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

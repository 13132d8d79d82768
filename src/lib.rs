//! Tourbook - client core for tour and hotel booking
//!
//! This crate owns the multi-step booking and authentication flows, the
//! session store, and the typed facades over the hosted backend that
//! provides authentication, file storage and record persistence.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

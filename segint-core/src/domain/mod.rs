//! Core domain types
//!
//! This module contains the core domain structures used across segint services.
//! These types represent the fundamental business entities and are shared between
//! the server (for persistence) and the worker (for execution).

pub mod catalog;
pub mod job;

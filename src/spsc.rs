//! Core SPSC (Single-Producer Single-Consumer) queue primitives.
//!
//! This module contains the ring buffer algorithm behind
//! [`crate::sync::spsc`], the in-process queue endpoints.

pub(crate) mod ring;

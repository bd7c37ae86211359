//! # planner-channels
//!
//! Notification delivery channels for Planner.

pub mod whatsapp;

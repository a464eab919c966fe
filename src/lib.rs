//! Care Assist — child-care assistant core.
//!
//! Library components for the mobile client (onboarding flow, conversation
//! session, preference store) plus the HTTP service that proxies the
//! assistants API and serves activity-plan and behavior-log endpoints.

pub mod activities;
pub mod behavior;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod prefs;
pub mod routines;
pub mod server;

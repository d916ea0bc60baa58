#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analytics;
pub(crate) mod api;
pub mod app;
pub mod classify;
pub mod config;
pub mod observability;
pub mod pipeline;
pub mod ratelimit;
pub mod store;

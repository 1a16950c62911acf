//! survey-web: a small survey application server
//!
//! Settings are resolved once at startup; every request then runs
//! through an explicit middleware pipeline (body parsing, static files,
//! view locals, route dispatch, 404 synthesis) that funnels failures
//! into an environment-selected error renderer.

pub mod error;
pub mod http;
pub mod logger;
pub mod pipeline;
pub mod routes;
pub mod settings;
pub mod state;
pub mod store;
pub mod views;

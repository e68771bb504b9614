//! HTTP API surface: service, admin, and actor routers plus the shared
//! authentication extractors.

pub mod actor;
pub mod admin;
pub mod extractors;
pub mod service;

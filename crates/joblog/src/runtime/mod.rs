//! Runtime module: process startup.

pub mod boot;

// Incubator dashboard - live sensor charts and device control
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

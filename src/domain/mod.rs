// Domain layer - Dashboard model, validation and chart rules
pub mod axis;
pub mod dashboard;
pub mod device;
pub mod metric;
pub mod reading;
pub mod series;
pub mod update;

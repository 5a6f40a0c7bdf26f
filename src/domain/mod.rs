// Domain layer - records shown on the back-office dashboards
pub mod activity;
pub mod collection;
pub mod dashboard;
pub mod device;
pub mod kpi;
pub mod notification;
pub mod order;
pub mod range;
pub mod series;
pub mod sparkline;

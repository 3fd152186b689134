pub mod dispatch_service;
pub mod health_service;

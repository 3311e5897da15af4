// handlers/mod.rs - HTTP surface of a service
//
// resource.rs  ← generic CRUD + search handlers, instantiated per entity
// passenger.rs ← POST /api/registerpassenger
// health.rs    ← GET / and GET /health

pub mod health;
pub mod passenger;
pub mod resource;

pub use health::{health_routes, HealthState};
pub use passenger::registration_routes;
pub use resource::{resource_routes, ResourceState};

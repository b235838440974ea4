//! Backend services callable from rendered pages

pub mod args;
pub mod greet;
pub mod registry;

pub use args::FromArgs;
pub use greet::GreetService;
pub use registry::{
    MethodDescriptor, MethodTable, Service, ServiceCall, ServiceDescriptor, ServiceRegistry,
};

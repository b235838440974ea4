//! Service registry: explicit (service, method) dispatch tables.
//!
//! Each service fills a [`MethodTable`] once at registration; every entry is a
//! typed thunk that decodes the positional JSON arguments, calls the method and
//! encodes the result. Lookups afterwards are read-only, so `invoke` needs no
//! locking and can run from any number of request tasks at once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::args::FromArgs;
use crate::error::{BoxError, BridgeError, Resource, Result};

type Thunk = Box<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// A backend object whose methods rendered pages can call.
///
/// Services are registered once and never removed. If a service holds mutable
/// state it must synchronize it itself; the registry adds no locking.
pub trait Service: Send + Sync + 'static {
    /// Unique name pages use to address this service
    fn name(&self) -> &str;

    /// Declare the callable methods.
    fn methods(self: Arc<Self>, table: &mut MethodTable);
}

/// One page-originated request, consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    pub service: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ServiceCall {
    pub fn new(service: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            args,
        }
    }
}

/// Signature of a registered method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<&'static str>,
    pub returns: &'static str,
}

/// A registered service and its methods, sorted by method name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

struct MethodEntry {
    thunk: Thunk,
    descriptor: MethodDescriptor,
}

/// Collects a service's methods during registration.
pub struct MethodTable {
    service: String,
    entries: BTreeMap<String, MethodEntry>,
    error: Option<BridgeError>,
}

impl MethodTable {
    fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: BTreeMap::new(),
            error: None,
        }
    }

    /// Register `name` as a method taking the tuple `Args` and returning `R`.
    ///
    /// A duplicate name poisons the table and fails the whole registration.
    pub fn method<Args, R, E, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        Args: FromArgs,
        R: Serialize + 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> std::result::Result<R, E> + Send + Sync + 'static,
    {
        if self.entries.contains_key(name) {
            let err = BridgeError::duplicate(Resource::Method, format!("{}.{}", self.service, name));
            self.error.get_or_insert(err);
            return self;
        }

        let service = self.service.clone();
        let method = name.to_string();
        let thunk: Thunk = Box::new(move |args| {
            let args = Args::from_args(args)?;
            let output = f(args).map_err(|e| BridgeError::InvocationFailed {
                service: service.clone(),
                method: method.clone(),
                source: e.into(),
            })?;
            serde_json::to_value(output).map_err(|e| BridgeError::InvocationFailed {
                service: service.clone(),
                method: method.clone(),
                source: Box::new(e),
            })
        });

        let descriptor = MethodDescriptor {
            name: name.to_string(),
            params: Args::param_types(),
            returns: std::any::type_name::<R>(),
        };
        self.entries
            .insert(name.to_string(), MethodEntry { thunk, descriptor });
        self
    }
}

/// Fixed set of services, built at startup.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, BTreeMap<String, MethodEntry>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service. Fails on a duplicate service name or duplicate method names.
    pub fn register<S: Service>(&mut self, service: S) -> Result<()> {
        let name = service.name().to_string();
        if self.services.contains_key(&name) {
            return Err(BridgeError::duplicate(Resource::Service, name));
        }

        let mut table = MethodTable::new(name.clone());
        Arc::new(service).methods(&mut table);
        if let Some(err) = table.error {
            return Err(err);
        }

        debug!(service = %name, methods = table.entries.len(), "Registered service");
        self.services.insert(name, table.entries);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Resolve and call `service.method(args)`.
    pub fn invoke(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        let methods = self
            .services
            .get(service)
            .ok_or_else(|| BridgeError::not_found(Resource::Service, service))?;
        let entry = methods
            .get(method)
            .ok_or_else(|| BridgeError::not_found(Resource::Method, format!("{}.{}", service, method)))?;

        (entry.thunk)(args)
    }

    pub fn call(&self, call: ServiceCall) -> Result<Value> {
        self.invoke(&call.service, &call.method, call.args)
    }

    /// Binding descriptors for every service, sorted by name.
    pub fn describe(&self) -> Vec<ServiceDescriptor> {
        let mut services: Vec<ServiceDescriptor> = self
            .services
            .iter()
            .map(|(name, methods)| ServiceDescriptor {
                name: name.clone(),
                methods: methods.values().map(|m| m.descriptor.clone()).collect(),
            })
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }
}

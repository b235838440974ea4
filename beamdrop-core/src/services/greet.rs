use std::convert::Infallible;
use std::sync::Arc;

use super::{MethodTable, Service};

/// Sample stateless service exposed to the UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreetService;

impl GreetService {
    pub const NAME: &'static str = "GreetService";

    pub fn greet(&self, name: &str) -> String {
        format!("Hello {}!", name)
    }
}

impl Service for GreetService {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn methods(self: Arc<Self>, table: &mut MethodTable) {
        table.method("Greet", move |(name,): (String,)| {
            Ok::<_, Infallible>(self.greet(&name))
        });
    }
}

use std::fmt;
use std::sync::Arc;

use crate::CustomFunction;
use crate::Key;

/// Options shared by client and server suites
#[derive(Clone, Default)]
pub struct SuiteOptions {
    /// Applied to every resolved key, in order
    pub custom_functions: Vec<CustomFunction>,
}

impl fmt::Debug for SuiteOptions {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SuiteOptions")
            .field("custom_functions", &self.custom_functions.len())
            .finish()
    }
}

impl SuiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_function(
        mut self,
        f: impl Fn(&mut Key) + Send + Sync + 'static,
    ) -> Self {
        self.custom_functions.push(Arc::new(f));
        self
    }
}

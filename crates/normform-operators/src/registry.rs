//! Stage registry keyed by normal form.
//!
//! The engine resolves a lowered stage chain through this table, so a caller
//! can swap in its own stage for one form without touching the driver.

use std::collections::HashMap;
use std::sync::Arc;

use normform_core::prelude::NormalForm;

use crate::stages::{
    BoyceCoddNormalForm, FifthNormalForm, FirstNormalForm, FourthNormalForm, SecondNormalForm,
    ThirdNormalForm,
};
use crate::traits::Stage;

#[derive(Clone)]
pub struct Registry {
    stages: HashMap<NormalForm, Arc<dyn Stage>>,
}

impl Registry {
    /// Registry holding the built-in stage for every form.
    pub fn new() -> Self {
        let mut reg = Self::empty();
        reg.register(Arc::new(FirstNormalForm));
        reg.register(Arc::new(SecondNormalForm));
        reg.register(Arc::new(ThirdNormalForm));
        reg.register(Arc::new(BoyceCoddNormalForm));
        reg.register(Arc::new(FourthNormalForm));
        reg.register(Arc::new(FifthNormalForm));
        reg
    }

    pub fn empty() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// Install `stage` under its own form, replacing any previous entry.
    pub fn register(&mut self, stage: Arc<dyn Stage>) -> Option<Arc<dyn Stage>> {
        self.stages.insert(stage.form(), stage)
    }

    pub fn make(&self, form: NormalForm) -> Option<Arc<dyn Stage>> {
        self.stages.get(&form).cloned()
    }

    /// Registered stage names, weakest form first.
    pub fn names(&self) -> Vec<&'static str> {
        let mut forms: Vec<_> = self.stages.keys().copied().collect();
        forms.sort();
        forms.iter().map(|f| self.stages[f].name()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("stages", &self.names())
            .finish()
    }
}

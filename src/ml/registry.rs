//! Named classifier factories.

use std::fmt;
use std::sync::Arc;

use crate::error::{ClassbenchError, Result};
use crate::ml::classifier::Classifier;
use crate::ml::models::{
    AdaBoostClassifier, BaggingClassifier, DecisionTreeClassifier, ExtraTreesClassifier,
    GaussianNb, GaussianProcessClassifier, GradientBoostingClassifier, KNeighborsClassifier,
    KernelSvc, LinearSvc, LogisticRegression, MultinomialNb, RandomForestClassifier,
    SgdClassifier,
};

/// Zero-argument constructor for an unfitted classifier.
pub type ClassifierFactory = Arc<dyn Fn() -> Box<dyn Classifier> + Send + Sync>;

/// Ordered name → factory table.
///
/// Registration order is evaluation order. Every evaluation calls the
/// factory again, so no fitted state is shared between runs.
#[derive(Clone, Default)]
pub struct ClassifierRegistry {
    entries: Vec<(String, ClassifierFactory)>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard roster of 17 classifiers.
    pub fn default_roster() -> Self {
        let mut registry = Self::new();
        registry
            .register("KNearestNeighbour", KNeighborsClassifier::default)
            .register("GaussianNaiveBayes", GaussianNb::default)
            .register("MultinomialNaiveBayes", MultinomialNb::default)
            .register("DecisionTree", DecisionTreeClassifier::default)
            .register("RandomForest", RandomForestClassifier::default)
            .register("ExtraTree", ExtraTreesClassifier::default)
            .register("SupportVectorMachine", KernelSvc::default)
            .register("LogisticRegression", LogisticRegression::default)
            .register("XGBoost", GradientBoostingClassifier::xgboost)
            .register("AdaptiveBoost", AdaBoostClassifier::default)
            .register("Nu-SupportVector", KernelSvc::nu)
            .register("LinearSupportVecor", LinearSvc::default)
            .register("StochasticGradientBoost", SgdClassifier::default)
            .register("GaussianProcessClassifier", GaussianProcessClassifier::default)
            .register("BaggingClassifier", BaggingClassifier::default)
            .register("GradientBoostingClassifier", GradientBoostingClassifier::default)
            .register("LightGradientBoost", GradientBoostingClassifier::lightgbm);
        registry
    }

    /// Add `name`; an existing entry with the same name is replaced in place.
    pub fn register<C, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        C: Classifier + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let factory: ClassifierFactory = Arc::new(move || Box::new(factory()));
        self.register_factory(name, factory)
    }

    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: ClassifierFactory,
    ) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh, unfitted instance of `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Classifier>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| ClassbenchError::unknown_classifier(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassifierFactory)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// A registry holding only `names`, in the given order.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut subset = Self::new();
        for name in names {
            let name = name.as_ref();
            let (_, factory) = self
                .entries
                .iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| ClassbenchError::unknown_classifier(name))?;
            subset.register_factory(name, Arc::clone(factory));
        }
        Ok(subset)
    }
}

impl fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("names", &self.names())
            .finish()
    }
}

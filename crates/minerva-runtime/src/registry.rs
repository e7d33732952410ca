//! Model and dataframe registries
//!
//! Name-keyed stores for opaque training/loading results. The evaluator
//! only stores and fetches by name; it never inspects a model beyond the
//! type tag needed to pick the predict routine. Entries are overwritten by
//! name re-use and live until an explicit clear.

use crate::value::{Metrics, Model};
use std::collections::HashMap;
use std::sync::Arc;

/// One stored model plus bookkeeping.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub model: Arc<Model>,
    pub type_tag: &'static str,
    pub metrics: Metrics,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: HashMap<String, ModelEntry>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry {
            entries: HashMap::new(),
        }
    }

    pub fn store(&mut self, name: &str, model: Arc<Model>, metrics: Metrics) {
        let type_tag = model.type_tag();
        self.entries.insert(
            name.to_string(),
            ModelEntry {
                model,
                type_tag,
                metrics,
            },
        );
    }

    pub fn fetch(&self, name: &str) -> Option<&Arc<Model>> {
        self.entries.get(name).map(|e| &e.model)
    }

    pub fn type_tag(&self, name: &str) -> Option<&'static str> {
        self.entries.get(name).map(|e| e.type_tag)
    }

    pub fn metrics(&self, name: &str) -> Option<&Metrics> {
        self.entries.get(name).map(|e| &e.metrics)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Display lines for listing trained models, sorted by name.
    pub fn summary(&self) -> Vec<String> {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let entry = &self.entries[name];
                let mut line = format!("{} ({})", name, entry.type_tag);
                let mut metrics: Vec<(&String, &f64)> = entry.metrics.iter().collect();
                metrics.sort_by_key(|(k, _)| k.as_str());
                for (metric, value) in metrics {
                    line.push_str(&format!(" {metric}={value:.4}"));
                }
                line
            })
            .collect()
    }
}

/// A loaded table: header names plus numeric rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataframe {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Dataframe {
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.rows.first().map_or(0, Vec::len);
        (self.rows.len(), cols)
    }
}

#[derive(Debug, Default)]
pub struct DataframeRegistry {
    entries: HashMap<String, Dataframe>,
}

impl DataframeRegistry {
    pub fn new() -> Self {
        DataframeRegistry {
            entries: HashMap::new(),
        }
    }

    pub fn store(&mut self, name: &str, headers: Vec<String>, rows: Vec<Vec<f64>>) {
        self.entries
            .insert(name.to_string(), Dataframe { headers, rows });
    }

    pub fn fetch(&self, name: &str) -> Option<&Dataframe> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Display lines in `name: rows x cols` form, sorted by name.
    pub fn summary(&self) -> Vec<String> {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let (rows, cols) = self.entries[name].shape();
                format!("{name}: {rows} rows x {cols} columns")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn perceptron() -> Arc<Model> {
        Arc::new(Model::Perceptron {
            weights: vec![0.2, -0.1],
            bias: 0.05,
        })
    }

    #[test]
    fn store_and_fetch_by_name() {
        let mut registry = ModelRegistry::new();
        registry.store("clf", perceptron(), Metrics::new());
        assert_eq!(registry.type_tag("clf"), Some("perceptron"));
        assert!(registry.fetch("clf").is_some());
        assert!(registry.fetch("other").is_none());
    }

    #[test]
    fn reuse_of_a_name_overwrites() {
        let mut registry = ModelRegistry::new();
        registry.store("m", perceptron(), Metrics::new());
        registry.store(
            "m",
            Arc::new(Model::KMeans {
                centroids: vec![vec![0.0]],
                assignments: vec![0],
                k: 1,
            }),
            Metrics::new(),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.type_tag("m"), Some("kmeans"));
    }

    #[test]
    fn summary_includes_metrics() {
        let mut registry = ModelRegistry::new();
        let mut metrics = Metrics::new();
        metrics.insert("inertia".to_string(), 1.25);
        registry.store(
            "groups",
            Arc::new(Model::KMeans {
                centroids: vec![vec![0.0]],
                assignments: vec![0],
                k: 1,
            }),
            metrics,
        );
        assert_eq!(registry.summary(), ["groups (kmeans) inertia=1.2500"]);
    }

    #[test]
    fn dataframe_shape_and_summary() {
        let mut registry = DataframeRegistry::new();
        registry.store(
            "iris",
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        );
        assert_eq!(registry.fetch("iris").unwrap().shape(), (3, 2));
        assert_eq!(registry.summary(), ["iris: 3 rows x 2 columns"]);
    }
}

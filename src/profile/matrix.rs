//src/profile/matrix.rs

use ahash::AHashMap;

use crate::error::{ProfileError, Result};

/// Counts of one sample, as read from its classifier output.
#[derive(Debug, Clone, Default)]
pub struct SampleProfile {
    pub name: String,
    pub counts: Vec<(String, f64)>,
}

/// A feature x sample table of counts. Rows are features, columns are
/// samples; both axes carry unique labels. Cells a source did not report are 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMatrix {
    features: Vec<String>,
    samples: Vec<String>,
    /// One row per feature, each `samples.len()` long.
    values: Vec<Vec<f64>>,
}

impl ProfileMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix from already-aligned rows. Row labels and sample labels
    /// are assumed unique.
    pub fn from_rows(features: Vec<String>, samples: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(features.len(), values.len());
        debug_assert!(values.iter().all(|row| row.len() == samples.len()));
        Self { features, samples, values }
    }

    /// Outer-joins per-sample profiles over their feature labels, filling
    /// missing cells with 0. Sample labels must be unique.
    pub fn outer_join(profiles: Vec<SampleProfile>) -> Result<Self> {
        let mut samples: Vec<String> = Vec::with_capacity(profiles.len());
        for profile in &profiles {
            if samples.contains(&profile.name) {
                return Err(ProfileError::DuplicateSample { name: profile.name.clone() });
            }
            samples.push(profile.name.clone());
        }

        let n_samples = samples.len();
        let mut features: Vec<String> = Vec::new();
        let mut row_of: AHashMap<String, usize> = AHashMap::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for (col, profile) in profiles.into_iter().enumerate() {
            for (feature, count) in profile.counts {
                let row = match row_of.get(&feature) {
                    Some(&row) => row,
                    None => {
                        row_of.insert(feature.clone(), features.len());
                        features.push(feature);
                        values.push(vec![0.0; n_samples]);
                        values.len() - 1
                    }
                };
                values[row][col] += count;
            }
        }

        Ok(Self { features, samples, values })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn row(&self, feature: &str) -> Option<&[f64]> {
        let idx = self.features.iter().position(|f| f == feature)?;
        Some(&self.values[idx])
    }

    pub fn get(&self, feature: &str, sample: &str) -> Option<f64> {
        let col = self.samples.iter().position(|s| s == sample)?;
        self.row(feature).map(|row| row[col])
    }

    /// `(feature, row)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.features
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Number of non-zero cells.
    pub fn nnz(&self) -> usize {
        self.values
            .iter()
            .map(|row| row.iter().filter(|v| **v != 0.0).count())
            .sum()
    }

    /// Re-keys every row through `key`, summing rows that land on the same
    /// key. New rows keep the order in which their key first appears.
    pub fn regroup<F>(&self, key: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        self.regroup_filtered(|feature| Some(key(feature)))
    }

    /// Like [`regroup`](Self::regroup), dropping rows for which `key` returns `None`.
    pub fn regroup_filtered<F>(&self, key: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut features: Vec<String> = Vec::new();
        let mut row_of: AHashMap<String, usize> = AHashMap::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for (feature, row) in self.rows() {
            let Some(new_key) = key(feature) else {
                continue;
            };
            match row_of.get(&new_key) {
                Some(&idx) => {
                    for (acc, v) in values[idx].iter_mut().zip(row) {
                        *acc += v;
                    }
                }
                None => {
                    row_of.insert(new_key.clone(), features.len());
                    features.push(new_key);
                    values.push(row.to_vec());
                }
            }
        }

        Self {
            features,
            samples: self.samples.clone(),
            values,
        }
    }

    /// Copy with both axes in ascending label order.
    pub fn sorted(&self) -> Self {
        let mut row_order: Vec<usize> = (0..self.features.len()).collect();
        row_order.sort_by(|&a, &b| self.features[a].cmp(&self.features[b]));
        let mut col_order: Vec<usize> = (0..self.samples.len()).collect();
        col_order.sort_by(|&a, &b| self.samples[a].cmp(&self.samples[b]));

        Self {
            features: row_order.iter().map(|&r| self.features[r].clone()).collect(),
            samples: col_order.iter().map(|&c| self.samples[c].clone()).collect(),
            values: row_order
                .iter()
                .map(|&r| col_order.iter().map(|&c| self.values[r][c]).collect())
                .collect(),
        }
    }
}

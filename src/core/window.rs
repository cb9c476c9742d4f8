use serde::{Deserialize, Serialize};

/// Fixed-duration slice of multichannel EEG, the basic unit of processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Per-channel sample rows (n_channels x n_samples), physical units (microvolts)
    pub data: Vec<Vec<f64>>,

    /// Sampling rate in Hz
    pub fs: u64,

    /// Seconds since stream/recording start of the first sample
    pub start_timestamp: f64,

    /// Channel names in row order
    pub channel_names: Vec<String>,
}

impl Window {
    pub fn new(data: Vec<Vec<f64>>, fs: u64, start_timestamp: f64, channel_names: Vec<String>) -> Self {
        Self {
            data,
            fs,
            start_timestamp,
            channel_names,
        }
    }

    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    pub fn n_samples(&self) -> usize {
        self.data.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn duration(&self) -> f64 {
        if self.fs == 0 {
            return 0.0;
        }
        self.n_samples() as f64 / self.fs as f64
    }

    pub fn channel(&self, idx: usize) -> Option<&[f64]> {
        self.data.get(idx).map(|row| row.as_slice())
    }

    /// Sample-wise mean over all channels
    pub fn mean_across_channels(&self) -> Vec<f64> {
        self.channel_group_mean(&(0..self.n_channels()).collect::<Vec<_>>())
    }

    /// Sample-wise mean over a subset of channels (e.g. one hemisphere)
    pub fn channel_group_mean(&self, indices: &[usize]) -> Vec<f64> {
        let n = self.n_samples();
        let rows: Vec<&Vec<f64>> = indices.iter().filter_map(|&i| self.data.get(i)).collect();
        if rows.is_empty() || n == 0 {
            return Vec::new();
        }
        let mut out = vec![0.0; n];
        for row in &rows {
            for (acc, &v) in out.iter_mut().zip(row.iter()) {
                *acc += v;
            }
        }
        let scale = 1.0 / rows.len() as f64;
        for v in &mut out {
            *v *= scale;
        }
        out
    }

    /// Population variance over every sample in the window
    pub fn variance(&self) -> f64 {
        let total: usize = self.data.iter().map(|row| row.len()).sum();
        if total == 0 {
            return 0.0;
        }
        let sum: f64 = self.data.iter().flatten().sum();
        let mean = sum / total as f64;
        let sq: f64 = self
            .data
            .iter()
            .flatten()
            .map(|&v| (v - mean) * (v - mean))
            .sum();
        sq / total as f64
    }

}

use serde::Serialize;

use crate::config::AnalysisConfig;

const MAX_KEY_LEVELS: usize = 5;
const MIN_LEVEL_STRENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A clustered historical price acting as support or resistance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyLevel {
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: LevelKind,
    /// Number of closes in the cluster.
    pub strength: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCluster {
    pub centroid: f64,
    pub members: Vec<f64>,
}

impl PriceCluster {
    fn new(price: f64) -> Self {
        Self {
            centroid: price,
            members: vec![price],
        }
    }

    fn admit(&mut self, price: f64) {
        self.members.push(price);
        self.centroid = self.members.iter().sum::<f64>() / self.members.len() as f64;
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Greedy single-pass clustering in the given order.
///
/// Each price joins the first cluster whose centroid lies within
/// `tolerance` relative distance, otherwise it opens a new cluster.
/// First match wins even when a later centroid is nearer.
pub fn cluster_prices(prices: &[f64], tolerance: f64) -> Vec<PriceCluster> {
    let mut clusters: Vec<PriceCluster> = Vec::new();

    for &price in prices {
        match clusters
            .iter_mut()
            .find(|c| (c.centroid - price).abs() / c.centroid < tolerance)
        {
            Some(cluster) => cluster.admit(price),
            None => clusters.push(PriceCluster::new(price)),
        }
    }

    clusters
}

/// Support and resistance levels from the trailing closes.
///
/// Closes are visited in ascending price order; clusters are ranked by
/// member count with ties kept in creation order.
pub fn key_levels(closes: &[f64], current_price: f64, config: &AnalysisConfig) -> Vec<KeyLevel> {
    let start = closes.len().saturating_sub(config.level_lookback);
    let mut recent = closes[start..].to_vec();
    recent.sort_by(|a, b| a.total_cmp(b));

    let mut clusters = cluster_prices(&recent, config.level_tolerance);
    clusters.sort_by(|a, b| b.count().cmp(&a.count()));

    clusters
        .into_iter()
        .take(MAX_KEY_LEVELS)
        .filter(|c| c.count() >= MIN_LEVEL_STRENGTH)
        .map(|c| KeyLevel {
            price: c.centroid,
            kind: if c.centroid < current_price {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            },
            strength: c.count(),
        })
        .collect()
}

// KPI domain model - headline numbers with a sparkline series
use super::series::SeriesPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKey {
    Revenue,
    Orders,
    Aov,
    Refunds,
}

impl KpiKey {
    pub const ALL: [KpiKey; 4] = [KpiKey::Revenue, KpiKey::Orders, KpiKey::Aov, KpiKey::Refunds];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiKey::Revenue => "revenue",
            KpiKey::Orders => "orders",
            KpiKey::Aov => "aov",
            KpiKey::Refunds => "refunds",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KpiKey::Revenue => "Revenue",
            KpiKey::Orders => "Orders",
            KpiKey::Aov => "Average order value",
            KpiKey::Refunds => "Refunds",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiMetric {
    pub key: KpiKey,
    pub label: String,
    pub value: f64,
    /// Percent change against the previous period
    pub delta: f64,
    pub series: Vec<SeriesPoint>,
}

impl KpiMetric {
    pub fn new(key: KpiKey, value: f64, delta: f64, series: Vec<SeriesPoint>) -> Self {
        Self {
            key,
            label: key.label().to_string(),
            value,
            delta,
            series,
        }
    }

    /// Signed delta as shown on a card, e.g. "+12.4" or "-2.1"
    pub fn delta_label(&self) -> String {
        format!("{:+.1}", self.delta)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub revenue: KpiMetric,
    pub orders: KpiMetric,
    pub aov: KpiMetric,
    pub refunds: KpiMetric,
}

impl Kpis {
    pub fn get(&self, key: KpiKey) -> &KpiMetric {
        match key {
            KpiKey::Revenue => &self.revenue,
            KpiKey::Orders => &self.orders,
            KpiKey::Aov => &self.aov,
            KpiKey::Refunds => &self.refunds,
        }
    }

    pub fn metrics(&self) -> [&KpiMetric; 4] {
        [&self.revenue, &self.orders, &self.aov, &self.refunds]
    }

    pub fn metrics_mut(&mut self) -> [&mut KpiMetric; 4] {
        [&mut self.revenue, &mut self.orders, &mut self.aov, &mut self.refunds]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_label_keeps_sign() {
        assert_eq!(KpiMetric::new(KpiKey::Revenue, 1.0, 12.4, vec![]).delta_label(), "+12.4");
        assert_eq!(KpiMetric::new(KpiKey::Orders, 1.0, -2.1, vec![]).delta_label(), "-2.1");
        assert_eq!(KpiMetric::new(KpiKey::Refunds, 1.0, 1.0, vec![]).delta_label(), "+1.0");
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(KpiKey::parse("aov"), Some(KpiKey::Aov));
        assert_eq!(KpiKey::parse("profit"), None);
    }
}

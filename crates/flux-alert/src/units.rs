use std::collections::BTreeMap;

/// 指标单位换算表：上报前将值除以对应的除数
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTable {
    divisors: BTreeMap<String, f64>,
}

impl UnitTable {
    pub fn new(divisors: BTreeMap<String, f64>) -> Self {
        Self { divisors }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    pub fn convert(&self, metric: &str, value: f64) -> f64 {
        match self.divisors.get(metric) {
            Some(divisor) => value / divisor,
            None => value,
        }
    }
}

impl Default for UnitTable {
    /// network-tx 与 disk-write 以 KB/s 采集
    fn default() -> Self {
        let divisors = [("network-tx", 1024.0), ("disk-write", 1024.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self::new(divisors)
    }
}

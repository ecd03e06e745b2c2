//! Data models for benchmark results and suites

mod result;
mod suite;

pub use result::{Benchmark, BenchmarkResult, Measurement, Metadata, Node};
pub use suite::{Suite, SuiteBenchmark};

/// Serde helper that stores a `Duration` as integer nanoseconds
pub(crate) mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(d.as_nanos()).map_err(serde::ser::Error::custom)?;
        s.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(d)?;
        let nanos = u64::try_from(nanos).map_err(serde::de::Error::custom)?;
        Ok(Duration::from_nanos(nanos))
    }
}

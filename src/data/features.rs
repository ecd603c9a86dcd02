use super::model::{FeatureVector, PollutantReading};
use crate::error::{Result, SourceError};
use crate::spatial::CategoryDistances;

/// Pollutants read from the request, in column order. `true` = required.
const POLLUTANT_COLUMNS: [(&str, bool); 3] = [("pm2_5", true), ("no2", false), ("so2", false)];

/// Assemble `[pm2_5, no2, so2, road, industrial, residential]`.
///
/// Optional pollutants that are absent become 0. A missing `pm2_5` is an
/// input error and no vector is produced.
pub fn build_vector(reading: &PollutantReading, distances: &CategoryDistances) -> Result<FeatureVector> {
    let mut pollutants = [0.0; 3];
    for (slot, (name, required)) in pollutants.iter_mut().zip(POLLUTANT_COLUMNS) {
        match reading.get(name) {
            Some(v) => *slot = v,
            None if required => return Err(SourceError::MissingField(name.to_string())),
            None => {}
        }
    }

    let [pm2_5, no2, so2] = pollutants;
    Ok(FeatureVector::from_values([
        pm2_5,
        no2,
        so2,
        distances.road,
        distances.industrial,
        distances.residential,
    ]))
}

use crate::{
    config::ThermostatConfig,
    filter::{AveragingBuffer, FILTER_DEPTH},
    types::Reading,
};

/// Open interval of believable temperatures, in tenths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlausibilityBand {
    pub min_exclusive: i32,
    pub max_exclusive: i32,
}

impl PlausibilityBand {
    pub fn contains(self, temperature: i32) -> bool {
        temperature > self.min_exclusive && temperature < self.max_exclusive
    }
}

/// Result of feeding one decoded sample through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingest {
    /// Always published.
    pub humidity: i32,
    /// New filter average, or `None` when the sample was discarded.
    pub temperature: Option<i32>,
}

/// Validation and smoothing applied to every decoded sensor sample.
#[derive(Debug, Clone)]
pub struct SamplePipeline {
    band: PlausibilityBand,
    filter: AveragingBuffer<FILTER_DEPTH>,
}

impl SamplePipeline {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self {
            band: PlausibilityBand {
                min_exclusive: config.plausible_min,
                max_exclusive: config.plausible_max,
            },
            filter: AveragingBuffer::new(config.seed_temperature()),
        }
    }

    pub fn ingest(&mut self, reading: Reading) -> Ingest {
        let temperature = if self.band.contains(reading.temperature) {
            self.filter.append(reading.temperature);
            Some(self.filter.average())
        } else {
            None
        };

        Ingest {
            humidity: reading.humidity,
            temperature,
        }
    }

    pub fn average(&self) -> i32 {
        self.filter.average()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> SamplePipeline {
        SamplePipeline::new(&ThermostatConfig::default())
    }

    #[test]
    fn band_edges_are_exclusive() {
        let band = PlausibilityBand {
            min_exclusive: 300,
            max_exclusive: 1100,
        };
        assert!(!band.contains(300));
        assert!(band.contains(301));
        assert!(band.contains(1099));
        assert!(!band.contains(1100));
    }

    #[test]
    fn implausible_sample_leaves_filter_untouched() {
        let mut pipeline = pipeline();
        let before = pipeline.average();

        let ingest = pipeline.ingest(Reading {
            temperature: -999,
            humidity: 41,
        });

        assert_eq!(ingest.temperature, None);
        assert_eq!(ingest.humidity, 41);
        assert_eq!(pipeline.average(), before);
    }

    #[test]
    fn valid_sample_is_smoothed_against_seed() {
        let mut pipeline = pipeline();

        let ingest = pipeline.ingest(Reading {
            temperature: 545,
            humidity: 50,
        });

        // [545, 720, 720, 720] -> 6762 / 10
        assert_eq!(ingest.temperature, Some(676));
    }

    #[test]
    fn humidity_is_published_even_when_temperature_rejected() {
        let mut pipeline = pipeline();
        let ingest = pipeline.ingest(Reading {
            temperature: 1_500,
            humidity: 99,
        });
        assert_eq!(
            ingest,
            Ingest {
                humidity: 99,
                temperature: None
            }
        );
    }
}

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::collections::HashSet;

pub struct Metrics {
    request_counter: IntCounterVec,
    detection_duration: HistogramVec,
    detection_errors: IntCounterVec,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("detection_api".into()), None)?;

        let request_counter = IntCounterVec::new(
            Opts::new("requests_total", "Total number of requests"),
            &["route"],
        )?;

        let boundaries = generate_boundaries((1, 11, 21, 101, 1001));
        let detection_duration = HistogramVec::new(
            HistogramOpts::new(
                "detection_duration_ms",
                "Duration of decode and detection in milliseconds",
            )
            .buckets(boundaries),
            &["kind"],
        )?;

        let detection_errors = IntCounterVec::new(
            Opts::new("detection_errors_total", "Rejected or failed detection requests"),
            &["kind", "reason"],
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(detection_duration.clone()))?;
        registry.register(Box::new(detection_errors.clone()))?;

        Ok(Metrics {
            request_counter,
            detection_duration,
            detection_errors,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        self.request_counter.with_label_values(&[route]).inc();
    }

    pub fn record_detection_duration(&self, duration_ms: f64, kind: &str) {
        self.detection_duration
            .with_label_values(&[kind])
            .observe(duration_ms);
    }

    pub fn record_detection_error(&self, kind: &str, reason: &str) {
        self.detection_errors
            .with_label_values(&[kind, reason])
            .inc();
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 2;
    let middle_step: usize = 5;
    let end_step: usize = 20;
    let tail_step: usize = 100;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_boundaries() {
        let parts = (1, 5, 15, 55, 255);
        let get = generate_boundaries(parts);
        let expected = vec![1.0, 3.0, 5.0, 10.0, 15.0, 35.0, 55.0, 155.0, 255.0];

        assert_eq!(get, expected);
    }

    #[test]
    fn test_boundaries_are_sorted() {
        let get = generate_boundaries((1, 11, 21, 101, 1001));
        assert!(get.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_metrics_are_gathered() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("/api/detection/face");
        metrics.record_detection_duration(3.0, "face");
        metrics.record_detection_error("object", "decode");

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();

        assert!(names.contains(&"detection_api_requests_total".to_string()));
        assert!(names.contains(&"detection_api_detection_duration_ms".to_string()));
        assert!(names.contains(&"detection_api_detection_errors_total".to_string()));
    }
}

// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock geocoding provider for deterministic testing.
//!
//! `MockGeocoder` implements `GeocodeProvider` with scripted answers,
//! enabling gateway and search tests without network access.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use waypin_core::types::{AdapterType, HealthStatus, PlaceCandidate};
use waypin_core::{GeocodeProvider, PluginAdapter, WaypinError};

type Scripted = Result<Vec<PlaceCandidate>, String>;

#[derive(Default)]
struct Script {
    queued: VecDeque<Scripted>,
    calls: Vec<String>,
}

/// A geocoder that answers from a script.
///
/// Queued answers are popped in FIFO order. When the queue is empty the
/// fallback answer is returned. The answer is chosen when the call starts,
/// before any configured delay elapses.
pub struct MockGeocoder {
    name: String,
    fallback: Scripted,
    delay: Option<Duration>,
    script: Mutex<Script>,
}

impl MockGeocoder {
    /// A geocoder that always succeeds with `candidates`.
    pub fn returning(name: &str, candidates: Vec<PlaceCandidate>) -> Self {
        Self::with_fallback(name, Ok(candidates))
    }

    /// A geocoder that always fails with a provider error carrying `message`.
    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_fallback(name, Err(message.to_string()))
    }

    fn with_fallback(name: &str, fallback: Scripted) -> Self {
        Self {
            name: name.to_string(),
            fallback,
            delay: None,
            script: Mutex::new(Script::default()),
        }
    }

    /// Sleep this long before answering. Honors paused tokio time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a one-off successful answer.
    pub fn push_ok(&self, candidates: Vec<PlaceCandidate>) {
        self.script().queued.push_back(Ok(candidates));
    }

    /// Queue a one-off failure.
    pub fn push_err(&self, message: &str) {
        self.script().queued.push_back(Err(message.to_string()));
    }

    /// Queries received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.script().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PluginAdapter for MockGeocoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Geocoder
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypinError> {
        Ok(match &self.fallback {
            Ok(_) => HealthStatus::Healthy,
            Err(message) => HealthStatus::Unhealthy(message.clone()),
        })
    }

    async fn shutdown(&self) -> Result<(), WaypinError> {
        Ok(())
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocoder {
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError> {
        let answer = {
            let mut script = self.script();
            script.calls.push(query.to_string());
            script
                .queued
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        answer.map_err(|message| WaypinError::Provider {
            message: format!("{}: {message}", self.name),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(label: &str) -> PlaceCandidate {
        PlaceCandidate {
            label: label.into(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    #[tokio::test]
    async fn queued_answers_before_fallback() {
        let mock = MockGeocoder::returning("mock", vec![place("default")]);
        mock.push_ok(vec![place("first")]);
        mock.push_err("boom");

        assert_eq!(mock.lookup("a").await.unwrap(), vec![place("first")]);
        assert!(matches!(
            mock.lookup("b").await,
            Err(WaypinError::Provider { .. })
        ));
        assert_eq!(mock.lookup("c").await.unwrap(), vec![place("default")]);
        assert_eq!(mock.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failing_reports_unhealthy() {
        let mock = MockGeocoder::failing("down", "503");
        assert!(matches!(
            mock.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        let err = mock.lookup("x").await.unwrap_err();
        assert!(err.to_string().contains("down: 503"));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_uses_tokio_time() {
        let mock = MockGeocoder::returning("slow", vec![]).with_delay(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        mock.lookup("x").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}

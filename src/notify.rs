/// Background notification polling.
///
/// One poller thread per subject, started at most once. A subject is
/// either untracked (INIT) or has an entry in the poller registry
/// (POLLING); the registry entry is the state, and check-and-insert
/// happens under a single lock guard so concurrent `start` calls race
/// safely: exactly one of them spawns the thread.
///
/// Each cycle fetches current weather, keys the air-quality lookup off
/// the coordinates the weather response carries, evaluates both
/// readings against the threshold set, and prints/appends any alerts.
/// A failed gateway call skips the rest of the cycle and the loop
/// continues; nothing short of cancellation stops a poller.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::alert::evaluator::check_alerts;
use crate::alert::sink::AlertLog;
use crate::alert::thresholds::ThresholdSet;
use crate::ingest::{AirQualityProvider, WeatherProvider};
use crate::logging::{self, LogSource};

// ---------------------------------------------------------------------------
// Cancellation token
// ---------------------------------------------------------------------------

/// Shared flag a poller sleeps on between cycles.
///
/// The inter-cycle sleep is a condvar wait on this token, so `cancel`
/// wakes the thread immediately instead of letting it run out a full
/// interval.
struct CancelToken {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl CancelToken {
    fn new() -> Self {
        Self {
            cancelled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap() = true;
        self.condvar.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap()
    }

    /// Sleeps for `timeout` or until cancelled, whichever comes first.
    /// Returns `true` when woken by cancellation.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.cancelled.lock().unwrap();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .condvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap();
            cancelled = guard;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

struct Poller {
    token: Arc<CancelToken>,
    handle: JoinHandle<()>,
}

/// Owns the per-subject poller registry and the dependencies every
/// poller shares. Gateways arrive as injected trait objects; nothing
/// here reaches for ambient globals.
pub struct Notifier {
    weather: Arc<dyn WeatherProvider>,
    air_quality: Arc<dyn AirQualityProvider>,
    thresholds: Arc<ThresholdSet>,
    alert_log: AlertLog,
    interval: Duration,
    pollers: Mutex<HashMap<String, Poller>>,
}

impl Notifier {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        air_quality: Arc<dyn AirQualityProvider>,
        thresholds: ThresholdSet,
        alert_log: AlertLog,
        interval: Duration,
    ) -> Self {
        Self {
            weather,
            air_quality,
            thresholds: Arc::new(thresholds),
            alert_log,
            interval,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Starts polling for `subject`.
    ///
    /// Returns `true` when a new poller was created, `false` when one
    /// already exists; the second and every later call for the same
    /// subject is a no-op. Safe to call from concurrent threads: the
    /// registry lock is held across the presence check and the insert.
    pub fn start(&self, subject: &str) -> bool {
        let mut pollers = self.pollers.lock().unwrap();
        if pollers.contains_key(subject) {
            return false;
        }

        let token = Arc::new(CancelToken::new());
        let handle = {
            let subject = subject.to_string();
            let weather = Arc::clone(&self.weather);
            let air_quality = Arc::clone(&self.air_quality);
            let thresholds = Arc::clone(&self.thresholds);
            let alert_log = self.alert_log.clone();
            let interval = self.interval;
            let token = Arc::clone(&token);
            thread::spawn(move || {
                run_poll_loop(
                    &subject,
                    weather.as_ref(),
                    air_quality.as_ref(),
                    &thresholds,
                    &alert_log,
                    interval,
                    &token,
                )
            })
        };

        pollers.insert(subject.to_string(), Poller { token, handle });
        logging::info(LogSource::System, Some(subject), "notifications started");
        true
    }

    /// Cancels the poller for `subject` and joins its thread.
    /// Returns `false` when no poller exists for the subject.
    pub fn stop(&self, subject: &str) -> bool {
        let poller = self.pollers.lock().unwrap().remove(subject);
        match poller {
            Some(poller) => {
                poller.token.cancel();
                let _ = poller.handle.join();
                logging::info(LogSource::System, Some(subject), "notifications stopped");
                true
            }
            None => false,
        }
    }

    /// Cancels every poller, then joins them all.
    pub fn stop_all(&self) {
        let drained: Vec<(String, Poller)> =
            self.pollers.lock().unwrap().drain().collect();
        for (_, poller) in &drained {
            poller.token.cancel();
        }
        for (subject, poller) in drained {
            let _ = poller.handle.join();
            logging::info(LogSource::System, Some(&subject), "notifications stopped");
        }
    }

    /// Whether a poller is registered for `subject`.
    pub fn is_polling(&self, subject: &str) -> bool {
        self.pollers.lock().unwrap().contains_key(subject)
    }

    /// Subjects currently being polled.
    pub fn active_subjects(&self) -> Vec<String> {
        self.pollers.lock().unwrap().keys().cloned().collect()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

fn run_poll_loop(
    subject: &str,
    weather: &dyn WeatherProvider,
    air_quality: &dyn AirQualityProvider,
    thresholds: &ThresholdSet,
    alert_log: &AlertLog,
    interval: Duration,
    token: &CancelToken,
) {
    loop {
        if token.is_cancelled() {
            return;
        }
        poll_cycle(subject, weather, air_quality, thresholds, alert_log);
        if token.wait(interval) {
            return;
        }
    }
}

/// One polling cycle: fetch, evaluate, emit.
///
/// Gateway failures are logged and swallowed here: the cycle is
/// skipped, never the loop.
fn poll_cycle(
    subject: &str,
    weather: &dyn WeatherProvider,
    air_quality: &dyn AirQualityProvider,
    thresholds: &ThresholdSet,
    alert_log: &AlertLog,
) {
    let weather_reading = match weather.current(subject) {
        Ok(reading) => reading,
        Err(e) => {
            logging::log_gateway_failure(
                LogSource::Weather,
                Some(subject),
                "current conditions fetch",
                &e,
            );
            return;
        }
    };

    let air_reading = match air_quality.current(weather_reading.coord) {
        Ok(reading) => reading,
        Err(e) => {
            logging::log_gateway_failure(
                LogSource::AirQuality,
                Some(subject),
                "pollution fetch",
                &e,
            );
            return;
        }
    };

    let alerts = check_alerts(&weather_reading, &air_reading, thresholds);
    if alerts.is_empty() {
        logging::debug(LogSource::System, Some(subject), "cycle clear, no alerts");
        return;
    }

    for alert in &alerts {
        println!("{}", alert);
        logging::warn(LogSource::System, Some(subject), &alert.message);
    }
    if let Err(e) = alert_log.append_batch(&alerts) {
        logging::error(
            LogSource::System,
            Some(subject),
            &format!("failed to append {} alert(s): {}", alerts.len(), e),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AirQualityReading, Coordinates, GatewayError, WeatherReading};
    use chrono::Utc;
    use indexmap::IndexMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    static SEQ: AtomicU32 = AtomicU32::new(0);

    fn scratch_log(tag: &str) -> PathBuf {
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "airmon_notify_{}_{}_{}.log",
            tag,
            std::process::id(),
            n
        ))
    }

    fn coord() -> Coordinates {
        Coordinates {
            latitude: 39.7817,
            longitude: -89.6501,
        }
    }

    /// Weather fake: counts calls, fails for the first `fail_first`
    /// calls, then reports the configured temperature.
    struct FakeWeather {
        calls: AtomicUsize,
        fail_first: usize,
        temperature: f64,
    }

    impl FakeWeather {
        fn steady(temperature: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: 0,
                temperature,
            }
        }

        fn flaky(fail_first: usize, temperature: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
                temperature,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WeatherProvider for FakeWeather {
        fn current(&self, city: &str) -> Result<WeatherReading, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(GatewayError::HttpStatus(503));
            }
            Ok(WeatherReading {
                city: city.to_string(),
                coord: coord(),
                temperature: Some(self.temperature),
                humidity: Some(10.0),
                wind_speed: Some(1.0),
                retrieved_at: Utc::now(),
            })
        }
    }

    /// Air-quality fake: always succeeds with an empty pollutant map.
    struct FakeAir;

    impl AirQualityProvider for FakeAir {
        fn current(&self, c: Coordinates) -> Result<AirQualityReading, GatewayError> {
            Ok(AirQualityReading {
                coord: c,
                concentrations: IndexMap::new(),
                retrieved_at: Utc::now(),
            })
        }
    }

    fn notifier_with(weather: Arc<FakeWeather>, interval: Duration, log: &PathBuf) -> Notifier {
        Notifier::new(
            weather,
            Arc::new(FakeAir),
            ThresholdSet::default(),
            AlertLog::new(log),
            interval,
        )
    }

    /// Polls `predicate` for up to two seconds.
    fn eventually(predicate: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    // --- Idempotent start ----------------------------------------------------

    #[test]
    fn test_second_start_for_same_subject_is_a_noop() {
        let log = scratch_log("noop");
        let notifier = notifier_with(
            Arc::new(FakeWeather::steady(20.0)),
            Duration::from_secs(60),
            &log,
        );
        assert!(notifier.start("Springfield"));
        assert!(!notifier.start("Springfield"));
        assert_eq!(notifier.active_subjects().len(), 1);
        notifier.stop_all();
        std::fs::remove_file(&log).ok();
    }

    #[test]
    fn test_concurrent_starts_create_exactly_one_poller() {
        let log = scratch_log("race");
        let notifier = Arc::new(notifier_with(
            Arc::new(FakeWeather::steady(20.0)),
            Duration::from_secs(60),
            &log,
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let notifier = Arc::clone(&notifier);
            handles.push(thread::spawn(move || notifier.start("Springfield")));
        }
        let created: usize = handles
            .into_iter()
            .map(|h| h.join().expect("starter thread panicked"))
            .filter(|started| *started)
            .count();

        assert_eq!(created, 1, "exactly one racing start call may win");
        assert_eq!(notifier.active_subjects().len(), 1);
        notifier.stop_all();
        std::fs::remove_file(&log).ok();
    }

    #[test]
    fn test_distinct_subjects_each_get_a_poller() {
        let log = scratch_log("multi");
        let notifier = notifier_with(
            Arc::new(FakeWeather::steady(20.0)),
            Duration::from_secs(60),
            &log,
        );
        assert!(notifier.start("Springfield"));
        assert!(notifier.start("Peoria"));
        let mut subjects = notifier.active_subjects();
        subjects.sort();
        assert_eq!(subjects, vec!["Peoria", "Springfield"]);
        notifier.stop_all();
        std::fs::remove_file(&log).ok();
    }

    // --- Cancellation --------------------------------------------------------

    #[test]
    fn test_stop_joins_poller_and_second_stop_reports_absent() {
        let log = scratch_log("stop");
        let notifier = notifier_with(
            Arc::new(FakeWeather::steady(20.0)),
            Duration::from_secs(60),
            &log,
        );
        assert!(notifier.start("Springfield"));
        assert!(notifier.stop("Springfield"));
        assert!(!notifier.stop("Springfield"));
        assert!(!notifier.is_polling("Springfield"));
        std::fs::remove_file(&log).ok();
    }

    #[test]
    fn test_stop_wakes_a_sleeping_poller_promptly() {
        let log = scratch_log("wake");
        let notifier = notifier_with(
            Arc::new(FakeWeather::steady(20.0)),
            Duration::from_secs(3600),
            &log,
        );
        notifier.start("Springfield");

        // The poller is deep in its hour-long sleep; stop must not
        // wait the interval out.
        let begun = Instant::now();
        notifier.stop("Springfield");
        assert!(
            begun.elapsed() < Duration::from_secs(5),
            "stop took {:?}, poller did not wake on cancellation",
            begun.elapsed()
        );
        std::fs::remove_file(&log).ok();
    }

    // --- Failure recovery ----------------------------------------------------

    #[test]
    fn test_failed_gateway_cycles_do_not_kill_the_loop() {
        let log = scratch_log("flaky");
        let weather = Arc::new(FakeWeather::flaky(2, 20.0));
        let notifier = notifier_with(Arc::clone(&weather), Duration::from_millis(10), &log);
        notifier.start("Springfield");

        // Two failing cycles, then successes. The loop must keep
        // calling the gateway well past the failures.
        assert!(
            eventually(|| weather.call_count() >= 5),
            "loop stalled after gateway failures, {} calls made",
            weather.call_count()
        );
        assert!(notifier.is_polling("Springfield"));
        notifier.stop_all();
        std::fs::remove_file(&log).ok();
    }

    // --- Alert emission ------------------------------------------------------

    #[test]
    fn test_breaching_cycle_appends_alerts_to_the_sink() {
        let log = scratch_log("hot");
        let notifier = notifier_with(
            Arc::new(FakeWeather::steady(36.0)),
            Duration::from_secs(60),
            &log,
        );
        notifier.start("Springfield");

        assert!(
            eventually(|| log.exists()),
            "breaching reading never reached the alert sink"
        );
        notifier.stop_all();

        let contents = std::fs::read_to_string(&log).expect("sink readable");
        assert!(
            contents.contains("High Temperature Alert: 36°C!"),
            "unexpected sink contents: {}",
            contents
        );
        std::fs::remove_file(&log).ok();
    }

    #[test]
    fn test_quiet_cycles_leave_no_sink_file() {
        let log = scratch_log("quiet");
        let weather = Arc::new(FakeWeather::steady(20.0));
        let notifier = notifier_with(Arc::clone(&weather), Duration::from_millis(10), &log);
        notifier.start("Springfield");

        assert!(eventually(|| weather.call_count() >= 3));
        notifier.stop_all();
        assert!(
            !log.exists(),
            "quiet cycles must not create the alert log"
        );
    }
}

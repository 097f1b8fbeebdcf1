use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use agrisense_simulator::controllers::Simulator;
use agrisense_simulator::errors::SimulatorError;
use agrisense_simulator::models::{default_sensors, Reading};
use agrisense_simulator::services::{HttpTransmitter, ReadingSink, TransmitOutcome};
use agrisense_simulator::state_management::{SimulationLifecycle, SimulationState};

const SENSOR_IDS: [&str; 3] = ["sensor_001", "sensor_002", "sensor_003"];

/// A request captured by the fake ingestion API
#[derive(Debug, Clone)]
struct CapturedRequest {
    request_line: String,
    content_type: Option<String>,
    body: Value,
}

/// Minimal HTTP/1.1 responder answering every request with a fixed status
struct FakeIngestionApi {
    url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeIngestionApi {
    async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let captured = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let captured = Arc::clone(&captured);
                tokio::spawn(async move {
                    serve_one(socket, status, captured).await;
                });
            }
        });

        Self {
            url: format!("http://{}/api/sensors/data", addr),
            requests,
        }
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_one(mut socket: TcpStream, status: u16, captured: Arc<Mutex<Vec<CapturedRequest>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let request = loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let header = |name: &str| {
            head.lines()
                .skip(1)
                .filter_map(|line| line.split_once(':'))
                .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim().to_string())
        };
        let content_length = header("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        if buf.len() < body_start + content_length {
            continue;
        }

        break CapturedRequest {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            content_type: header("content-type"),
            body: serde_json::from_slice(&buf[body_start..body_start + content_length]).unwrap_or(Value::Null),
        };
    };

    captured.lock().unwrap().push(request);

    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{{}}",
        status, reason
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Wraps another sink and records every outcome with the time it was produced
struct RecordingSink {
    inner: Arc<dyn ReadingSink>,
    outcomes: Mutex<Vec<(Instant, TransmitOutcome)>>,
}

impl RecordingSink {
    fn new(inner: Arc<dyn ReadingSink>) -> Arc<Self> {
        Arc::new(Self { inner, outcomes: Mutex::new(Vec::new()) })
    }

    fn outcomes(&self) -> Vec<(Instant, TransmitOutcome)> {
        self.outcomes.lock().unwrap().clone()
    }

    fn len(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }
}

#[async_trait]
impl ReadingSink for RecordingSink {
    async fn send(&self, reading: &Reading) -> TransmitOutcome {
        let outcome = self.inner.send(reading).await;
        self.outcomes.lock().unwrap().push((Instant::now(), outcome.clone()));
        outcome
    }
}

/// Accepts everything without touching the network
struct AcceptAll;

#[async_trait]
impl ReadingSink for AcceptAll {
    async fn send(&self, reading: &Reading) -> TransmitOutcome {
        TransmitOutcome::Delivered {
            sensor_id: reading.sensor_id.clone(),
            humidity: reading.humidity,
            temperature: reading.temperature,
        }
    }
}

/// Requests a stop while handling the reading of one chosen sensor
struct StopOnSensor {
    trigger: &'static str,
    lifecycle: Arc<SimulationLifecycle>,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl ReadingSink for StopOnSensor {
    async fn send(&self, reading: &Reading) -> TransmitOutcome {
        self.seen.lock().unwrap().push(reading.sensor_id.clone());
        if reading.sensor_id == self.trigger {
            self.lifecycle.stop();
        }
        AcceptAll.send(reading).await
    }
}

fn http_transmitter(url: &str) -> Arc<dyn ReadingSink> {
    Arc::new(HttpTransmitter::new(url, Duration::from_secs(5)).unwrap())
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met before deadline");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn healthy_endpoint_receives_one_json_reading_per_sensor() {
    let api = FakeIngestionApi::start(200).await;
    let simulator = Simulator::new(default_sensors(), http_transmitter(&api.url), Duration::from_millis(10));

    let outcomes = simulator.run_tick().await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(TransmitOutcome::is_delivered));
    let ids: Vec<_> = outcomes.iter().map(|o| o.sensor_id().to_string()).collect();
    assert_eq!(ids, SENSOR_IDS);

    let requests = api.requests();
    assert_eq!(requests.len(), 3);
    for (request, sensor) in requests.iter().zip(default_sensors()) {
        assert!(request.request_line.starts_with("POST /api/sensors/data"));
        assert_eq!(request.content_type.as_deref(), Some("application/json"));

        let body = &request.body;
        assert_eq!(body["sensor_id"], sensor.id.as_str());
        assert_eq!(body["location"]["lat"], sensor.location.lat);
        assert_eq!(body["location"]["lng"], sensor.location.lng);
        assert_eq!(body["location"]["name"], sensor.location.name.as_str());
        assert_eq!(body["metadata"]["crop_type"], sensor.crop_type.as_str());
        assert_eq!(body["metadata"]["soil_type"], sensor.soil_type.as_str());
        assert_eq!(body["metadata"]["sensor_name"], sensor.name.as_str());
        for field in ["humidity", "temperature", "soil_ph", "battery_level", "signal_strength", "timestamp"] {
            assert!(!body[field].is_null(), "missing {}", field);
        }
    }
}

#[tokio::test]
async fn delivered_outcome_echoes_the_sent_values() {
    let api = FakeIngestionApi::start(200).await;
    let simulator = Simulator::new(default_sensors(), http_transmitter(&api.url), Duration::from_millis(10));

    let outcomes = simulator.run_tick().await;
    let requests = api.requests();

    for (outcome, request) in outcomes.iter().zip(requests.iter()) {
        match outcome {
            TransmitOutcome::Delivered { humidity, temperature, .. } => {
                assert_eq!(request.body["humidity"].as_f64(), Some(*humidity));
                assert_eq!(request.body["temperature"].as_f64(), Some(*temperature));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

#[tokio::test]
async fn server_errors_are_reported_and_the_loop_keeps_going() {
    let api = FakeIngestionApi::start(500).await;
    let sink = RecordingSink::new(http_transmitter(&api.url));
    let simulator = Simulator::new(default_sensors(), sink.clone(), Duration::from_millis(20));

    let handle = simulator.spawn().unwrap();
    wait_until(|| sink.len() >= 6).await;
    handle.shutdown().await.unwrap();

    let outcomes = sink.outcomes();
    for (i, (_, outcome)) in outcomes.iter().enumerate() {
        assert_eq!(outcome.sensor_id(), SENSOR_IDS[i % 3]);
        assert_eq!(outcome, &TransmitOutcome::Rejected { sensor_id: SENSOR_IDS[i % 3].to_string(), status: 500 });
        let line = outcome.to_string();
        assert!(line.contains(SENSOR_IDS[i % 3]) && line.contains("500"), "{}", line);
    }
    assert!(api.requests().len() >= 6);
}

#[tokio::test]
async fn unreachable_endpoint_reports_transport_errors_and_the_loop_keeps_going() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = format!("http://{}/api/sensors/data", addr);

    let sink = RecordingSink::new(http_transmitter(&url));
    let simulator = Simulator::new(default_sensors(), sink.clone(), Duration::from_millis(20));

    let handle = simulator.spawn().unwrap();
    wait_until(|| sink.len() >= 6).await;
    handle.shutdown().await.unwrap();

    for (i, (_, outcome)) in sink.outcomes().iter().enumerate() {
        match outcome {
            TransmitOutcome::Failed { sensor_id, error } => {
                assert_eq!(sensor_id, SENSOR_IDS[i % 3]);
                assert!(!error.is_empty());
                assert!(outcome.to_string().contains(SENSOR_IDS[i % 3]));
            }
            other => panic!("expected a transport failure, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn stop_mid_tick_finishes_the_pass_then_exits() {
    let lifecycle = Arc::new(SimulationLifecycle::new());
    let sink = Arc::new(StopOnSensor {
        trigger: "sensor_002",
        lifecycle: Arc::clone(&lifecycle),
        seen: Mutex::new(Vec::new()),
    });
    let simulator = Simulator::new(default_sensors(), sink.clone(), Duration::from_millis(10))
        .with_lifecycle(lifecycle);

    tokio::time::timeout(Duration::from_secs(5), simulator.run())
        .await
        .expect("loop did not exit after stop")
        .unwrap();

    assert_eq!(*sink.seen.lock().unwrap(), SENSOR_IDS);
    assert_eq!(simulator.state(), SimulationState::Stopped);
}

#[tokio::test]
async fn consecutive_ticks_are_spaced_by_the_interval() {
    let interval = Duration::from_millis(200);
    let sink = RecordingSink::new(Arc::new(AcceptAll));
    let simulator = Simulator::new(default_sensors(), sink.clone(), interval);

    let handle = simulator.spawn().unwrap();
    wait_until(|| sink.len() >= 6).await;
    handle.shutdown().await.unwrap();

    let outcomes = sink.outcomes();
    let first_tick = outcomes[0].0;
    let second_tick = outcomes[3].0;
    assert!(second_tick.duration_since(first_tick) >= interval);
    assert_eq!(outcomes[3].1.sensor_id(), "sensor_001");
}

#[tokio::test]
async fn background_handle_returns_immediately_and_stops_on_request() {
    let sink = RecordingSink::new(Arc::new(AcceptAll));
    let simulator = Simulator::new(default_sensors(), sink.clone(), Duration::from_millis(10));

    let handle = simulator.spawn().unwrap();
    assert!(handle.is_running());
    assert_eq!(simulator.state(), SimulationState::Running);

    wait_until(|| sink.len() >= 3).await;
    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("background task did not stop")
        .unwrap();

    assert_eq!(simulator.state(), SimulationState::Stopped);
    assert_eq!(sink.len() % 3, 0, "a pass was cut short");
}

#[tokio::test]
async fn a_running_simulator_cannot_be_started_twice() {
    let simulator = Simulator::new(default_sensors(), Arc::new(AcceptAll), Duration::from_millis(10));

    let handle = simulator.spawn().unwrap();
    assert!(matches!(simulator.spawn(), Err(SimulatorError::AlreadyRunning)));
    assert!(matches!(simulator.run().await, Err(SimulatorError::AlreadyRunning)));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn restart_after_stop_keeps_a_single_loop() {
    let interval = Duration::from_millis(300);
    let sink = RecordingSink::new(Arc::new(AcceptAll));
    let simulator = Simulator::new(default_sensors(), sink.clone(), interval);

    let first = simulator.spawn().unwrap();
    wait_until(|| sink.len() >= 3).await;
    first.stop();
    assert_eq!(simulator.state(), SimulationState::Stopping);

    // the first loop is still sleeping, so a new start is refused
    assert!(matches!(simulator.spawn(), Err(SimulatorError::AlreadyRunning)));
    assert!(!first.is_running());

    tokio::time::timeout(Duration::from_secs(5), first.wait())
        .await
        .expect("first loop did not exit")
        .unwrap();
    assert_eq!(simulator.state(), SimulationState::Stopped);
    let sent_by_first = sink.len();
    assert_eq!(sent_by_first, 3);

    let second = simulator.spawn().unwrap();
    wait_until(|| sink.len() >= sent_by_first + 6).await;
    second.shutdown().await.unwrap();

    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len() % 3, 0);
    let tick_starts: Vec<Instant> = outcomes[sent_by_first..].iter().step_by(3).map(|(at, _)| *at).collect();
    for pair in tick_starts.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= interval, "two loops were sending at once");
    }
    for (i, (_, outcome)) in outcomes.iter().enumerate() {
        assert_eq!(outcome.sensor_id(), SENSOR_IDS[i % 3]);
    }
}

#[tokio::test]
async fn dropping_a_foreground_run_releases_the_lifecycle() {
    let simulator = Simulator::new(default_sensors(), Arc::new(AcceptAll), Duration::from_secs(60));

    let interrupted = tokio::time::timeout(Duration::from_millis(50), simulator.run()).await;
    assert!(interrupted.is_err());

    assert_eq!(simulator.state(), SimulationState::Stopped);
    let handle = simulator.spawn().unwrap();
    handle.stop();
}

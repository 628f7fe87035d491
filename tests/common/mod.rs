//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use coop_sim::sim::decision::DecisionProvider;
use coop_sim::sim::engine::Engine;
use coop_sim::sim::settlement::SimulationState;
use coop_sim::sim::types::{EconomicParams, GridPrice, HourlyRecord};
use coop_sim::storage::{StoragePool, StorageUnit};

/// Default economics (P2P 0.5, mint 0.1, burn 0.05).
pub fn default_params() -> EconomicParams {
    EconomicParams::new(0.5, 0.1, 0.05)
}

/// Hourly feed from `(consumption, production)` pairs, one per step.
pub fn hourly(values: &[(f64, f64)]) -> Vec<HourlyRecord> {
    values
        .iter()
        .enumerate()
        .map(|(step, &(consumption, production))| HourlyRecord {
            hour: (step % 24) as u32,
            date: format!("day-{:03}", step / 24 + 1),
            consumption,
            production,
        })
        .collect()
}

/// Flat tariff table of length `n`.
pub fn flat_prices(n: usize, purchase: f64, sale: f64) -> Vec<GridPrice> {
    vec![GridPrice { purchase, sale }; n]
}

/// State with storages given as `(name, capacity, initial_level)`.
pub fn state(storages: &[(&str, f64, f64)], balance: f64) -> SimulationState {
    let units = storages
        .iter()
        .map(|&(name, capacity, level)| StorageUnit::new(name, capacity, level))
        .collect();
    SimulationState::new(StoragePool::new(units), balance)
}

/// Engine with two empty 10 kWh storages, balance 100, and default economics.
pub fn default_engine<P: DecisionProvider>(
    provider: P,
    hourly_data: Vec<HourlyRecord>,
) -> Engine<P> {
    Engine::new(
        state(&[("A", 10.0, 0.0), ("B", 10.0, 0.0)], 100.0),
        default_params(),
        provider,
        hourly_data,
        flat_prices(24, 0.8, 0.3),
    )
}

/// A day with a sunny midday and a dark evening.
pub fn daily_profile(days: usize) -> Vec<(f64, f64)> {
    (0..days * 24)
        .map(|step| {
            let hour = step % 24;
            let production = if (7..18).contains(&hour) { 6.0 } else { 0.0 };
            let consumption = if (17..22).contains(&hour) { 5.0 } else { 2.5 };
            (consumption, production)
        })
        .collect()
}

/// URL on a port that nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/decide")
}

/// Server that accepts connections and never answers, so clients time out.
pub struct SilentServer {
    pub url: String,
}

impl SilentServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let url = format!("http://{}/decide", listener.local_addr().expect("local addr"));
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });
        Self { url }
    }
}

/// Minimal in-process HTTP server answering every request with a fixed
/// response and recording request bodies.
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Starts a server replying `status` with `body` to every request.
    pub fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let url = format!("http://{}/decide", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let body = body.to_string();

        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let Some(request) = read_request(&stream) else {
                    continue;
                };
                recorded.lock().expect("request log").push(request);
                respond(stream, status, &body);
            }
        });

        Self { url, requests }
    }

    /// Bodies of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

fn read_request(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut content_length = 0usize;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            if name.eq_ignore_ascii_case("transfer-encoding") {
                chunked = value.trim().eq_ignore_ascii_case("chunked");
            }
        }
    }
    let request = if chunked {
        read_chunked(&mut reader)?
    } else {
        let mut request = vec![0u8; content_length];
        reader.read_exact(&mut request).ok()?;
        request
    };
    String::from_utf8(request).ok()
}

fn respond(mut stream: TcpStream, status: u16, body: &str) {
    let reason = if status < 400 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_chunked(reader: &mut impl BufRead) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size = usize::from_str_radix(size_line.trim(), 16).ok()?;
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

//! Conformance test helpers for the wirenet engine.
//!
//! Circuits are written in a small line-oriented fixture format so that
//! integration tests read like schematics:
//!
//! ```text
//! # comment
//! wire  0,0 10,0
//! port  10,0 4
//! tunnel 0,0 4 data
//! bits  20,0 2 out N1,N2
//! pull  10,0 4 1
//! split 0,0 2@10,0 2@10,10
//! drive 0,0 0 1010
//! ```
//!
//! `drive` takes a point, a driver number, and a binary value written most
//! significant bit first. Malformed fixtures panic with the offending line.

#![warn(missing_docs)]

use wirenet_common::{Logic, Value};
use wirenet_engine::{
    load_config_from_str, propagate_all, BitTunnel, Circuit, Direction, DriverId, EngineConfig,
    Point, SimState, Splitter,
};

/// A circuit together with the simulation state its fixture drove.
pub struct Fixture {
    /// The parsed topology.
    pub circuit: Circuit,
    /// Drives from the fixture's `drive` lines. Not yet propagated.
    pub state: SimState,
}

impl Fixture {
    /// Resolves every point from scratch.
    pub fn resolve(&mut self) {
        propagate_all(&self.circuit, &mut self.state).unwrap();
    }

    /// The resolved value at `(x, y)`, formatted most significant bit first.
    pub fn value(&self, x: i32, y: i32) -> String {
        self.state.value_at((x, y)).to_string()
    }
}

/// Creates an `EngineConfig` with the given retry bound.
pub fn make_config(max_build_attempts: u32) -> EngineConfig {
    let toml_str = format!(
        r#"
[engine]
max_build_attempts = {max_build_attempts}
"#
    );
    load_config_from_str(&toml_str).unwrap()
}

/// Parses a fixture with the default configuration.
pub fn parse_fixture(src: &str) -> Fixture {
    parse_fixture_with_config(src, EngineConfig::default())
}

/// Parses a fixture into a circuit built with `config`.
pub fn parse_fixture_with_config(src: &str, config: EngineConfig) -> Fixture {
    let mut circuit = Circuit::with_config(config);
    let mut state = SimState::new();
    for (number, line) in src.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let number = number + 1;
        match fields.as_slice() {
            ["wire", a, b] => {
                circuit.add_wire(point(a), point(b));
            }
            ["port", p, w] => {
                circuit.add_port(point(p), int(w));
            }
            ["tunnel", p, w, label] => {
                circuit.add_tunnel(point(p), int(w), label);
            }
            ["tunnel", p, w] => {
                circuit.add_tunnel(point(p), int(w), "");
            }
            ["bits", p, w, dir, spec] => {
                let direction = match *dir {
                    "in" => Direction::Input,
                    "out" => Direction::Output,
                    _ => bad_line(number, line),
                };
                circuit.add_bit_tunnel(BitTunnel::new(point(p), int(w), spec, direction));
            }
            ["pull", p, w, v] => {
                let pull = v
                    .chars()
                    .next()
                    .and_then(Logic::from_char)
                    .unwrap_or_else(|| bad_line(number, line));
                circuit.add_pull_resistor(point(p), int(w), pull);
            }
            ["split", combined, groups @ ..] if !groups.is_empty() => {
                let groups: Vec<(Point, u32)> = groups
                    .iter()
                    .map(|g| {
                        let (w, p) = g.split_once('@').unwrap_or_else(|| bad_line(number, line));
                        (point(p), int(w))
                    })
                    .collect();
                circuit.add_splitter(Splitter::from_groups(point(combined), &groups));
            }
            ["drive", p, driver, v] => {
                let value = Value::from_binary_str(v).unwrap_or_else(|| bad_line(number, line));
                state.drive(point(p), DriverId::from_raw(int(driver)), value);
            }
            _ => bad_line(number, line),
        }
    }
    Fixture { circuit, state }
}

/// Parses a fixture and resolves it.
pub fn resolve_fixture(src: &str) -> Fixture {
    let mut fixture = parse_fixture(src);
    fixture.resolve();
    fixture
}

fn bad_line(number: usize, line: &str) -> ! {
    panic!("fixture line {number}: cannot parse `{line}`")
}

fn point(text: &str) -> Point {
    let (x, y) = text
        .split_once(',')
        .unwrap_or_else(|| panic!("bad point `{text}`"));
    Point::new(
        x.trim().parse().unwrap_or_else(|_| panic!("bad x in `{text}`")),
        y.trim().parse().unwrap_or_else(|_| panic!("bad y in `{text}`")),
    )
}

fn int(text: &str) -> u32 {
    text.parse()
        .unwrap_or_else(|_| panic!("bad number `{text}`"))
}

//! Bit-labeled tunnels: label nets, constants, don't-care bits, and their
//! interaction with plain tunnels.

use wirenet_common::Value;
use wirenet_conformance::{parse_fixture, resolve_fixture};
use wirenet_engine::{propagate, Direction, DriverId, Point};

#[test]
fn output_label_feeds_input_label() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 1 out N7
bits 300,200 1 in N7
drive 0,0 0 1
"#,
    );
    assert_eq!(fixture.value(300, 200), "1");
}

#[test]
fn label_net_reaches_wired_neighbors() {
    let fixture = resolve_fixture(
        r#"
wire -20,0 0,0
bits 0,0 1 out N7
bits 300,0 1 in n07
wire 300,0 320,0
drive -20,0 0 0
"#,
    );
    assert_eq!(fixture.value(320, 0), "0");
}

#[test]
fn multi_bit_specs_route_per_bit() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 3 out N1,N2,N3
bits 100,0 3 in N3,N1,x
drive 0,0 0 110
"#,
    );
    // Sender bits: N1=0, N2=1, N3=1. Receiver bit 0 <- N3, bit 1 <- N1.
    assert_eq!(fixture.value(100, 0), "x01");
}

#[test]
fn constant_on_output_tunnel_drives_net() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 2 out 1,0
"#,
    );
    assert_eq!(fixture.value(0, 0), "01");
}

#[test]
fn constant_on_input_tunnel_is_ignored() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 1 in 1
"#,
    );
    assert_eq!(fixture.value(0, 0), "x");

    let fixture = resolve_fixture(
        r#"
bits 0,0 1 in 1
drive 0,0 0 0
"#,
    );
    assert_eq!(fixture.value(0, 0), "0");
}

#[test]
fn direction_flip_rebuilds() {
    let mut fixture = resolve_fixture("bits 0,0 1 in 1");
    assert_eq!(fixture.value(0, 0), "x");
    let (id, _) = fixture.circuit.bit_tunnels().next().unwrap();
    fixture
        .circuit
        .set_bit_tunnel_direction(id, Direction::Output)
        .unwrap();
    propagate(&fixture.circuit, &mut fixture.state, [Point::new(0, 0)]).unwrap();
    assert_eq!(fixture.value(0, 0), "1");
}

#[test]
fn dont_care_bits_float() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 2 out x,X
bits 100,0 2 in x,x
drive 0,0 0 11
"#,
    );
    assert_eq!(fixture.value(0, 0), "11");
    assert_eq!(fixture.value(100, 0), "xx");
}

#[test]
fn dont_care_bit_takes_pull() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 1 in x
pull 0,0 1 1
"#,
    );
    assert_eq!(fixture.value(0, 0), "1");
}

#[test]
fn unmatched_label_is_unknown_not_error() {
    let fixture = resolve_fixture("bits 0,0 1 in N42");
    assert_eq!(fixture.value(0, 0), "x");
}

#[test]
fn short_spec_padded_long_spec_truncated() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 3 out N1
bits 100,0 1 in N1,N2,N3
drive 0,0 0 xx1
"#,
    );
    assert_eq!(fixture.value(100, 0), "1");
}

#[test]
fn constant_nets_are_shared_by_value() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 1 out 1
bits 100,0 1 out 0
bits 200,0 1 out 1
"#,
    );
    assert_eq!(fixture.value(0, 0), "1");
    assert_eq!(fixture.value(100, 0), "0");
    assert_eq!(fixture.value(200, 0), "1");
}

#[test]
fn opposing_constants_on_one_bundle_conflict() {
    let fixture = resolve_fixture(
        r#"
bits 0,0 1 out 1
wire 0,0 100,0
bits 100,0 1 out 0
"#,
    );
    assert_eq!(fixture.value(0, 0), "E");
}

#[test]
fn plain_label_and_bit_label_are_independent_sources() {
    let fixture = resolve_fixture(
        r#"
tunnel 0,0 1 N7
tunnel 50,0 1 N7
bits 50,0 1 out N7
bits 150,0 1 in N7
drive 0,0 0 1
"#,
    );
    // The plain tunnel joins (0,0) and (50,0); the bit label then carries
    // that bundle's bit to (150,0).
    assert_eq!(fixture.value(50, 0), "1");
    assert_eq!(fixture.value(150, 0), "1");
    let c = &fixture.circuit;
    assert_ne!(c.bundle_at((0, 0)), c.bundle_at((150, 0)));
}

#[test]
fn bit_spec_edit_reroutes() {
    let mut fixture = parse_fixture(
        r#"
bits 0,0 1 out N1
bits 100,0 1 in N1
"#,
    );
    fixture
        .state
        .drive((0, 0), DriverId::from_raw(0), Value::from_bool(true));
    fixture.resolve();
    assert_eq!(fixture.value(100, 0), "1");

    let id = fixture
        .circuit
        .bit_tunnels()
        .find(|(_, t)| t.location == Point::new(100, 0))
        .map(|(id, _)| id)
        .unwrap();
    fixture.circuit.set_bit_spec(id, "N2").unwrap();
    propagate(&fixture.circuit, &mut fixture.state, [Point::new(0, 0)]).unwrap();
    assert_eq!(fixture.value(100, 0), "x");
}

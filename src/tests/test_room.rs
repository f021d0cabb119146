use approx::relative_eq;
use log::info;

use crate::error::EchoError;
use crate::room::{simulate_batch, RoomSimulator, ShoeboxRoom};

fn anechoic() -> ShoeboxRoom {
    ShoeboxRoom { max_order: 0, ..ShoeboxRoom::default() }
}

#[test]
fn test_direct_path_delay_and_attenuation() {
    crate::init();
    info!("Test: direct path lands at d/c with 1/(4πd) energy");

    let room = anechoic();
    let mic = room.mics[0];
    // Source 1 m away from mic 0 along x.
    let src = [mic[0] + 1.0, mic[1], mic[2]];
    let [rir, _] = room.impulse_responses(src).unwrap();

    let expected_delay = 1.0 / room.speed_of_sound * room.sample_rate;
    let first_tap = expected_delay.floor() as usize;

    let nonzero: Vec<usize> = rir
        .iter()
        .enumerate()
        .filter(|(_, &v)| v != 0.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(
        nonzero,
        vec![first_tap, first_tap + 1],
        "direct path must occupy exactly the two taps around d/c"
    );

    // The two fractional taps sum to the full spherical attenuation.
    let total: f64 = rir.iter().sum();
    let expected = 1.0 / (4.0 * std::f64::consts::PI * 1.0);
    assert!(relative_eq!(total, expected, epsilon = 1e-12));
}

#[test]
fn test_reflections_add_energy() {
    crate::init();
    info!("Test: first-order images add energy over the direct path");

    let direct = anechoic();
    let reflective = ShoeboxRoom { max_order: 1, ..ShoeboxRoom::default() };
    let src = [2.0, 3.0, 1.5];

    let [rir0, _] = direct.impulse_responses(src).unwrap();
    let [rir1, _] = reflective.impulse_responses(src).unwrap();

    let e0: f64 = rir0.iter().map(|v| v * v).sum();
    let e1: f64 = rir1.iter().map(|v| v * v).sum();
    assert!(e1 > e0, "order-1 energy {:.3e} must exceed direct-only {:.3e}", e1, e0);
}

#[test]
fn test_source_outside_room_rejected() {
    crate::init();
    let room = ShoeboxRoom::default();
    let result = room.impulse_responses([7.0, 1.0, 1.0]);
    assert!(matches!(result, Err(EchoError::SourceOutsideRoom { .. })));

    // On-wall positions count as outside.
    let result = room.impulse_responses([0.0, 1.0, 1.0]);
    assert!(matches!(result, Err(EchoError::SourceOutsideRoom { .. })));
}

#[test]
fn test_batch_preserves_order_and_errors() {
    crate::init();
    let room = anechoic();
    let positions = [[2.0, 3.0, 1.5], [4.0, 3.0, 1.5]];
    let rirs = simulate_batch(&room, &positions).unwrap();
    assert_eq!(rirs.len(), 2);

    let direct = room.impulse_responses(positions[1]).unwrap();
    assert_eq!(rirs[1][0], direct[0], "batch output must preserve input order");

    let bad = [[2.0, 3.0, 1.5], [9.0, 9.0, 9.0]];
    assert!(simulate_batch(&room, &bad).is_err());
}

#[test]
fn test_array_center_is_mic_midpoint() {
    crate::init();
    let room = ShoeboxRoom::default();
    let c = room.array_center();
    assert!(relative_eq!(c[0], 3.0, epsilon = 1e-12));
    assert!(relative_eq!(c[1], 2.5, epsilon = 1e-12));
    assert!(relative_eq!(c[2], 1.5, epsilon = 1e-12));
}

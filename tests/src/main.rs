// Host-side clock simulator: runs the clock on mock hardware and prints the
// display once per simulated second

use clock_core::test_utils::simulator::Simulator;
use clock_core::{ButtonId, ClockConfig};

fn main() {
    let seconds: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(90);

    println!("🕰️  LED-filament clock simulator ({} s)", seconds);

    let config = ClockConfig::default();
    let mut sim = Simulator::new(config);

    // Release after power-up, then set 12:58 so a rollover shows up soon
    sim.tick(1);
    for _ in 0..58 {
        sim.press(ButtonId::Up, config.button_cooldown as u32 + 10);
    }
    println!("  ⏱️  time set after {} ticks", sim.ticks());

    let mut last = sim.text();
    println!("  [{:>4}s] {}", 0, last);
    for second in 1..=seconds {
        sim.run_seconds(1);
        let text = sim.text();
        if text != last {
            println!("  [{:>4}s] {}", second, text);
            last = text;
        }
    }

    let frame = sim.scan_cycle();
    println!(
        "✅ Done: {:?}, ramp {}/{}, fading: {}",
        sim.clock().time(),
        sim.clock().display().ramp_level(),
        sim.clock().display().ramp_max(),
        !frame.settled()
    );
}

// Host timing of the interrupt handlers, as a relative measure of their cost

use clock_core::hal::mock::{MockClockHal, MockStorage};
use clock_core::{ButtonId, Clock, ClockConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn clock() -> Clock<MockClockHal, MockStorage> {
    Clock::new(ClockConfig::default(), MockClockHal::new(), MockStorage::erased())
}

fn tick_handler(c: &mut Criterion) {
    let mut idle = clock();
    c.bench_function("on_tick idle", |b| b.iter(|| black_box(&mut idle).on_tick()));

    let mut held = clock();
    held.on_tick();
    held.hal().button(ButtonId::Up).set_pressed(true);
    c.bench_function("on_tick button held", |b| {
        b.iter(|| black_box(&mut held).on_tick())
    });
}

fn scan_handlers(c: &mut Criterion) {
    let mut clock = clock();
    c.bench_function("scan slot", |b| {
        b.iter(|| {
            let clock = black_box(&mut clock);
            clock.on_digit_select();
            clock.on_ramp_stop();
            clock.on_blanking();
        })
    });
}

criterion_group!(benches, tick_handler, scan_handlers);
criterion_main!(benches);

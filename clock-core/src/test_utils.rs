//! Test utilities for clock core functionality

pub mod button_script {
    //! Scripted button input

    use crate::buttons::ButtonId;
    use heapless::Vec;

    /// One scripted step, lasting `ticks` RTC ticks
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Step {
        /// No button pressed
        Idle { ticks: u32 },
        /// One button held, released afterwards
        Press { id: ButtonId, ticks: u32 },
        /// Both buttons held, released afterwards
        Both { ticks: u32 },
    }

    impl Step {
        pub fn ticks(&self) -> u32 {
            match *self {
                Step::Idle { ticks } | Step::Press { ticks, .. } | Step::Both { ticks } => ticks,
            }
        }

        pub fn pressed(&self, id: ButtonId) -> bool {
            match *self {
                Step::Idle { .. } => false,
                Step::Press { id: held, .. } => held == id,
                Step::Both { .. } => true,
            }
        }
    }

    /// Sequence of scripted steps
    #[derive(Debug, Clone, Default)]
    pub struct ButtonScript {
        pub steps: Vec<Step, 32>,
    }

    impl ButtonScript {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn idle(mut self, ticks: u32) -> Self {
            self.steps.push(Step::Idle { ticks }).ok();
            self
        }

        /// Press `id` for `ticks`, then release for one tick
        pub fn press(mut self, id: ButtonId, ticks: u32) -> Self {
            self.steps.push(Step::Press { id, ticks }).ok();
            self.steps.push(Step::Idle { ticks: 1 }).ok();
            self
        }

        /// Dual long-press combo held for `ticks`, then released
        pub fn combo(mut self, ticks: u32) -> Self {
            self.steps.push(Step::Both { ticks }).ok();
            self.steps.push(Step::Idle { ticks: 1 }).ok();
            self
        }

        pub fn total_ticks(&self) -> u64 {
            self.steps.iter().map(|s| s.ticks() as u64).sum()
        }
    }
}

pub mod frame_capture {
    //! Rendering what the multiplexed display shows

    use crate::display::DIGIT_COUNT;
    use crate::segment::{encode, Glyph, BLANK};
    use heapless::{String, Vec};

    /// Segment patterns seen during one full scan cycle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Frame {
        /// Pattern driven at digit-select
        pub lit: [u8; DIGIT_COUNT],
        /// Pattern driven after the ramp compare, if the fade was running
        pub faded: [Option<u8>; DIGIT_COUNT],
        pub dots: bool,
    }

    impl Frame {
        /// True when no digit is mid-fade
        pub fn settled(&self) -> bool {
            self.faded.iter().all(Option::is_none)
        }
    }

    /// Character for a segment pattern, `?` if it is not a known glyph
    pub fn glyph_char(pattern: u8) -> char {
        if pattern == BLANK {
            return ' ';
        }
        for d in 0..10u8 {
            if encode(Glyph::Digit(d)) == pattern {
                return (b'0' + d) as char;
            }
        }
        if pattern == encode(Glyph::CalibrationPositive) {
            'c'
        } else if pattern == encode(Glyph::CalibrationNegative) {
            'E'
        } else if pattern == encode(Glyph::BrightnessMarker) {
            'b'
        } else {
            '?'
        }
    }

    /// Text view of four patterns, with a `:` separator when the dots are on
    pub fn render_text(patterns: &[u8; DIGIT_COUNT], dots: bool) -> String<8> {
        let mut out = String::new();
        for (i, &p) in patterns.iter().enumerate() {
            if i == 2 {
                out.push(if dots { ':' } else { ' ' }).ok();
            }
            out.push(glyph_char(p)).ok();
        }
        out
    }

    /// Bounded history of captured frames
    #[derive(Debug, Default)]
    pub struct FrameCapture<const N: usize> {
        pub frames: Vec<Frame, N>,
    }

    impl<const N: usize> FrameCapture<N> {
        pub fn new() -> Self {
            Self { frames: Vec::new() }
        }

        /// Store a frame; returns false once the buffer is full
        pub fn push(&mut self, frame: Frame) -> bool {
            self.frames.push(frame).is_ok()
        }

        /// Number of scan cycles until the fade had settled
        pub fn settle_cycles(&self) -> Option<usize> {
            self.frames.iter().position(Frame::settled)
        }
    }
}

pub mod simulator {
    //! A `Clock` on mock hardware with a deterministic event order

    use super::button_script::ButtonScript;
    use super::frame_capture::{render_text, Frame};
    use crate::buttons::ButtonId;
    use crate::clock::Clock;
    use crate::display::DIGIT_COUNT;
    use crate::hal::mock::{MockClockHal, MockStorage};
    use crate::types::ClockConfig;
    use heapless::String;

    pub struct Simulator {
        clock: Clock<MockClockHal, MockStorage>,
        ticks: u64,
    }

    impl Simulator {
        /// Fresh board with erased storage
        pub fn new(config: ClockConfig) -> Self {
            Self::with_storage(config, MockStorage::erased())
        }

        pub fn with_storage(config: ClockConfig, storage: MockStorage) -> Self {
            Self {
                clock: Clock::new(config, MockClockHal::new(), storage),
                ticks: 0,
            }
        }

        pub fn clock(&self) -> &Clock<MockClockHal, MockStorage> {
            &self.clock
        }

        pub fn clock_mut(&mut self) -> &mut Clock<MockClockHal, MockStorage> {
            &mut self.clock
        }

        pub fn ticks(&self) -> u64 {
            self.ticks
        }

        pub fn set_button(&self, id: ButtonId, pressed: bool) {
            self.clock.hal().button(id).set_pressed(pressed);
        }

        pub fn tick(&mut self, n: u32) {
            for _ in 0..n {
                self.clock.on_tick();
                self.ticks += 1;
            }
        }

        pub fn run_seconds(&mut self, seconds: u32) {
            let hz = self.clock.config().tick_hz as u32;
            self.tick(seconds * hz);
        }

        /// Press `id` for `ticks`, then release for one tick
        pub fn press(&mut self, id: ButtonId, ticks: u32) {
            self.run_script(&ButtonScript::new().press(id, ticks));
        }

        /// Hold both buttons long enough for one combo, then release
        pub fn combo(&mut self) {
            let ticks = self.clock.config().button_longpress as u32 + 100;
            self.run_script(&ButtonScript::new().combo(ticks));
        }

        pub fn run_script(&mut self, script: &ButtonScript) {
            for step in &script.steps {
                for id in ButtonId::ALL {
                    self.set_button(id, step.pressed(id));
                }
                self.tick(step.ticks());
            }
            for id in ButtonId::ALL {
                self.set_button(id, false);
            }
        }

        /// Run one full multiplex cycle and record what each slot drove
        pub fn scan_cycle(&mut self) -> Frame {
            let mut frame = Frame {
                dots: self.clock.hal().segments.dots(),
                ..Frame::default()
            };
            for _ in 0..DIGIT_COUNT {
                let index = self.clock.display().current_digit();
                self.clock.on_digit_select();
                frame.lit[index] = self.clock.hal().segments.pattern();
                frame.faded[index] = self.clock.display().ramp_stop();
                self.clock.on_ramp_stop();
                self.clock.on_blanking();
            }
            frame
        }

        /// Text of what the display is fading towards
        pub fn text(&self) -> String<8> {
            render_text(&self.clock.display().targets(), self.clock.hal().segments.dots())
        }
    }
}

//! Gantry firmware facade.
//!
//! [`Gantry`] owns the two axes, the limit supervisor, the auxiliary
//! actuators, the frame codec and the reply queue, and wires them into the
//! two-level concurrency model: a fixed set of ISR entry points
//! (`on_rx_byte`, `on_tick_isr`, `on_h_timer`, `on_v_timer`) and a
//! non-blocking [`Gantry::poll`] for the main loop.
//!
//! # Concurrency contract
//!
//! Rust's `&mut` receiver makes exclusive access explicit: the platform is
//! responsible for calling the ISR entry points and `poll` on the same
//! `Gantry` under its interrupt-exclusion primitive (a critical section on
//! single-core targets). Inside that contract each ISR-owned counter has a
//! single writer, and `poll` only ever sees settled snapshots.

use crate::actuators::{CoilDrive, Gripper, GripperUpdate, ServoBank, ServoId, ServoPair, ServoUpdate};
use crate::axis::{Axis, AxisId, AxisState, Direction};
use crate::channel::StepperChannel;
use crate::config::{AxisConstraints, MachineConfig};
use crate::error::{CommandError, MotionError};
use crate::limits::{LimitSense, LimitSide, LimitSupervisor};
use crate::motion::{plan_coordinated, MotionProfile};
use crate::persist::{self, NvStore, PersistedState};
use crate::protocol::{self, Command, FrameDecoder, Outbox, ReplyLine};

/// Complete firmware core for the two-axis gantry.
pub struct Gantry<HC, VC, LS, SB, CD, NV>
where
    HC: StepperChannel,
    VC: StepperChannel,
    LS: LimitSense,
    SB: ServoBank,
    CD: CoilDrive,
    NV: NvStore,
{
    h_axis: Axis,
    v_axis: Axis,
    h_channel: HC,
    v_channel: VC,
    limit_sense: LS,
    limits: LimitSupervisor,
    servo_bank: SB,
    servos: ServoPair,
    coils: CD,
    gripper: Gripper,
    store: NV,
    decoder: FrameDecoder,
    outbox: Outbox,

    tick_pending: bool,
    tick_count: u32,
    ms_per_tick: u32,
    ticks_per_heartbeat: u32,
    heartbeat_countdown: u32,
    heartbeat_enabled: bool,

    move_active: bool,
    calibrating: bool,
    cal_origin_h: i32,
    cal_origin_v: i32,
}

impl<HC, VC, LS, SB, CD, NV> Gantry<HC, VC, LS, SB, CD, NV>
where
    HC: StepperChannel,
    VC: StepperChannel,
    LS: LimitSense,
    SB: ServoBank,
    CD: CoilDrive,
    NV: NvStore,
{
    /// Build the firmware core, restore persisted actuator state and
    /// announce readiness on the wire.
    pub fn new(
        config: &MachineConfig,
        h_channel: HC,
        v_channel: VC,
        limit_sense: LS,
        mut servo_bank: SB,
        coils: CD,
        mut store: NV,
    ) -> crate::error::Result<Self> {
        crate::config::validate_config(config)?;

        let h_axis = Axis::new(
            AxisId::Horizontal,
            AxisConstraints::from_config(&config.horizontal),
        );
        let v_axis = Axis::new(
            AxisId::Vertical,
            AxisConstraints::from_config(&config.vertical),
        );

        let mut servos = ServoPair::new(&config.servos);
        let mut gripper = Gripper::new(&config.gripper);

        match persist::load(&mut store) {
            Some(state) => {
                servos.restore(&mut servo_bank, state.servo1, state.servo2)?;
                gripper.restore(state.gripper_steps, state.gripper_closed);
            }
            None => {
                // First boot: drive neutral and seed the cell
                servos.reset(&mut servo_bank)?;
                let (servo1, servo2) = servos.positions();
                persist::save(
                    &mut store,
                    &PersistedState {
                        servo1,
                        servo2,
                        gripper_steps: 0,
                        gripper_closed: false,
                    },
                );
            }
        }

        let mut outbox = Outbox::new();
        outbox.send_str("SYSTEM_READY");

        let ticks_per_heartbeat = config.tick.rate_hz as u32;
        Ok(Self {
            h_axis,
            v_axis,
            h_channel,
            v_channel,
            limit_sense,
            limits: LimitSupervisor::new(),
            servo_bank,
            servos,
            coils,
            gripper,
            store,
            decoder: FrameDecoder::new(),
            outbox,
            tick_pending: false,
            tick_count: 0,
            ms_per_tick: config.ms_per_tick(),
            ticks_per_heartbeat,
            heartbeat_countdown: ticks_per_heartbeat,
            heartbeat_enabled: false,
            move_active: false,
            calibrating: false,
            cal_origin_h: 0,
            cal_origin_v: 0,
        })
    }

    // ===== ISR entry points =====

    /// Serial RX ISR body: feed one received byte to the frame codec.
    pub fn on_rx_byte(&mut self, byte: u8) {
        self.decoder.push(byte);
    }

    /// Periodic tick ISR body (100-500 Hz per configuration).
    pub fn on_tick_isr(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.tick_pending = true;
    }

    /// Horizontal stepper timer compare ISR body.
    pub fn on_h_timer(&mut self) {
        if self.h_axis.on_timer_event(&mut self.h_channel).is_err() {
            self.h_channel.disarm();
            self.h_axis.state = AxisState::Error;
        }
    }

    /// Vertical stepper timer compare ISR body.
    pub fn on_v_timer(&mut self) {
        if self.v_axis.on_timer_event(&mut self.v_channel).is_err() {
            self.v_channel.disarm();
            self.v_axis.state = AxisState::Error;
        }
    }

    // ===== main loop =====

    /// Run one main-loop iteration: dispatch a pending command frame, do
    /// the tick work if the tick ISR fired, and consolidate per-axis
    /// completion flags into the single move-completed report.
    pub fn poll(&mut self) {
        if let Some(frame) = self.decoder.take_frame() {
            self.dispatch(frame.as_str());
        }

        if self.tick_pending {
            self.tick_pending = false;
            self.tick_work();
        }

        self.consolidate_completion();
    }

    /// Drain the next wire-ready reply line.
    pub fn pop_reply(&mut self) -> Option<ReplyLine> {
        self.outbox.pop()
    }

    /// Milliseconds since boot, derived from the tick counter.
    pub fn now_ms(&self) -> u32 {
        self.tick_count.wrapping_mul(self.ms_per_tick)
    }

    /// Position snapshot in steps (H, V).
    pub fn position_steps(&self) -> (i32, i32) {
        (self.h_axis.current_position, self.v_axis.current_position)
    }

    /// Whether a coordinated move is in flight.
    pub fn is_moving(&self) -> bool {
        self.h_axis.is_moving() || self.v_axis.is_moving()
    }

    /// Reseat both position counters (homing glue, typically after a
    /// calibration run landed on the origin switches). Refused while a
    /// move is in flight.
    pub fn reseat_position(&mut self, h_steps: i32, v_steps: i32) -> bool {
        if self.is_moving() {
            return false;
        }
        self.h_axis.set_position(h_steps);
        self.v_axis.set_position(v_steps);
        true
    }

    // ===== command dispatch =====

    fn dispatch(&mut self, payload: &str) {
        match protocol::parse(payload) {
            Ok(command) => self.execute(command),
            Err(CommandError::UnknownVerb) | Err(CommandError::Empty) => {
                self.outbox
                    .send(format_args!("ERR:UNKNOWN_CMD:{}", payload));
            }
            Err(_) => {
                self.outbox
                    .send(format_args!("ERR:INVALID_PARAMS:{}", payload));
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Move { x_mm, y_mm } => self.cmd_move(x_mm, y_mm),
            Command::Stop => self.cmd_stop(),
            Command::ArmMove {
                angle1,
                angle2,
                time_ms,
            } => self.cmd_arm_move(angle1, angle2, time_ms),
            Command::ServoSet { servo, angle } => self.cmd_servo_set(servo, angle),
            Command::ArmsReset => self.cmd_arms_reset(),
            Command::GripperOpen => self.cmd_gripper_open(),
            Command::GripperClose => self.cmd_gripper_close(),
            Command::GripperToggle => self.cmd_gripper_toggle(),
            Command::GripperQuery => {
                self.outbox.send(format_args!(
                    "GRIPPER_STATUS:{},{}",
                    self.gripper.state().wire_name(),
                    self.gripper.position()
                ));
            }
            Command::SetSpeeds { h, v } => {
                let h = self.h_axis.constraints.clamp_speed(h);
                let v = self.v_axis.constraints.clamp_speed(v);
                self.h_axis.max_speed = h;
                self.v_axis.max_speed = v;
                self.outbox.send(format_args!("OK:VELOCITIES:{},{}", h, v));
            }
            Command::LimitQuery => self.send_limit_status(),
            Command::ServoQuery => {
                let (a1, a2) = self.servos.positions();
                self.outbox
                    .send(format_args!("SERVO_POSITIONS:{},{}", a1, a2));
            }
            Command::CalibrationStart => self.cmd_calibration_start(),
            Command::CalibrationEnd => self.cmd_calibration_end(),
            Command::Heartbeat { on } => {
                self.heartbeat_enabled = on;
                self.heartbeat_countdown = self.ticks_per_heartbeat;
                self.outbox
                    .send(format_args!("OK:HEARTBEAT:{}", if on { 1 } else { 0 }));
            }
            Command::PositionQuery => {
                let x = self
                    .h_axis
                    .constraints
                    .steps_to_mm(self.h_axis.current_position);
                let y = self
                    .v_axis
                    .constraints
                    .steps_to_mm(self.v_axis.current_position);
                self.outbox.send(format_args!("POS:{:.2},{:.2}", x, y));
            }
            Command::StatusQuery => {
                let state = if self.is_moving() { "MOVING" } else { "IDLE" };
                self.outbox.send(format_args!(
                    "STATUS:{},{},{}",
                    state, self.h_axis.current_position, self.v_axis.current_position
                ));
            }
        }
    }

    // ===== coordinated motion (C4) =====

    fn cmd_move(&mut self, x_mm: f32, y_mm: f32) {
        let dh = self.h_axis.constraints.mm_to_steps(x_mm);
        let dv = self.v_axis.constraints.mm_to_steps(y_mm);

        let target_h = self.h_axis.current_position + dh;
        let target_v = self.v_axis.current_position + dv;

        // Workspace enforcement is suspended in calibration mode: homing
        // deliberately drives toward a switch from an unknown position.
        if !self.calibrating {
            if !self.h_axis.constraints.in_workspace(target_h) {
                self.outbox.send(format_args!("ERR:BOUNDS:H,{}", target_h));
                return;
            }
            if !self.v_axis.constraints.in_workspace(target_v) {
                self.outbox.send(format_args!("ERR:BOUNDS:V,{}", target_v));
                return;
            }
        }

        // Re-entry: a new move silently replaces a running one
        self.h_axis.abort(&mut self.h_channel);
        self.v_axis.abort(&mut self.v_channel);
        self.h_axis.completed = false;
        self.v_axis.completed = false;
        self.move_active = false;

        // Limit veto demotes the blocked axis to zero distance
        let mut target_h = target_h;
        let mut target_v = target_v;
        if target_h != self.h_axis.current_position {
            let dir = Direction::from_delta(target_h - self.h_axis.current_position);
            if let Some(side) = self.limits.blocking_h(dir) {
                self.outbox
                    .send(format_args!("LIMIT_VETO:{}", side.wire_name()));
                target_h = self.h_axis.current_position;
            }
        }
        if target_v != self.v_axis.current_position {
            let dir = Direction::from_delta(target_v - self.v_axis.current_position);
            if let Some(side) = self.limits.blocking_v(dir) {
                self.outbox
                    .send(format_args!("LIMIT_VETO:{}", side.wire_name()));
                target_v = self.v_axis.current_position;
            }
        }

        let dh = (target_h - self.h_axis.current_position).unsigned_abs();
        let dv = (target_v - self.v_axis.current_position).unsigned_abs();

        let (h_plan, v_plan) = plan_coordinated(
            dh,
            dv,
            &self.h_axis.constraints,
            &self.v_axis.constraints,
            self.h_axis.max_speed,
            self.v_axis.max_speed,
        );

        self.outbox
            .send(format_args!("OK:MOVE_XY:{},{}", x_mm, y_mm));
        self.outbox.send(format_args!(
            "STEPPER_MOVE_STARTED:{},{}",
            target_h - self.h_axis.current_position,
            target_v - self.v_axis.current_position
        ));

        let homing = self.calibrating;
        if Self::launch_axis(
            &mut self.h_axis,
            &mut self.h_channel,
            target_h,
            h_plan.peak_speed,
            homing,
        )
        .is_err()
        {
            self.h_axis.state = AxisState::Error;
            self.outbox.send_str("ERR:DRIVER_FAULT:H");
            return;
        }
        if Self::launch_axis(
            &mut self.v_axis,
            &mut self.v_channel,
            target_v,
            v_plan.peak_speed,
            homing,
        )
        .is_err()
        {
            self.v_axis.state = AxisState::Error;
            self.outbox.send_str("ERR:DRIVER_FAULT:V");
            return;
        }

        self.move_active = true;
        // A fully vetoed or zero-distance move completes on the next poll
    }

    /// Seed direction, profile and cadence for one axis; a zero-distance
    /// axis is marked completed immediately and never arms its timer.
    fn launch_axis<C: StepperChannel>(
        axis: &mut Axis,
        channel: &mut C,
        target: i32,
        peak_speed: u32,
        homing: bool,
    ) -> Result<(), MotionError> {
        if target == axis.current_position {
            axis.move_origin = axis.current_position;
            axis.target_position = target;
            axis.completed = true;
            return Ok(());
        }

        axis.begin_move(target, peak_speed, homing);
        channel.set_direction(axis.direction)?;
        channel.set_enabled(true)?;
        axis.enabled = true;

        axis.profile = MotionProfile::plan(
            axis.current_position,
            target,
            peak_speed,
            axis.constraints.acceleration,
            axis.constraints.min_speed,
        );
        axis.current_speed = axis.constraints.min_speed;
        channel.arm(axis.constraints.min_speed)?;
        Ok(())
    }

    fn cmd_stop(&mut self) {
        let was_moving = self.is_moving();

        self.h_axis.abort(&mut self.h_channel);
        self.v_axis.abort(&mut self.v_channel);
        self.outbox.send_str("OK:STOP");

        if was_moving {
            self.send_move_report("STEPPER_EMERGENCY_STOP");
        }

        // Suppress the regular completion report for the cancelled move
        self.h_axis.completed = false;
        self.v_axis.completed = false;
        self.move_active = false;
    }

    fn consolidate_completion(&mut self) {
        if self.move_active && self.h_axis.completed && self.v_axis.completed {
            self.move_active = false;
            self.h_axis.completed = false;
            self.v_axis.completed = false;
            self.send_move_report("STEPPER_MOVE_COMPLETED");
        }
    }

    fn send_move_report(&mut self, event: &str) {
        let rel_h = self.h_axis.relative_travelled();
        let rel_v = self.v_axis.relative_travelled();
        let mm_h = libm::roundf(self.h_axis.constraints.steps_to_mm(rel_h)) as i32;
        let mm_v = libm::roundf(self.v_axis.constraints.steps_to_mm(rel_v)) as i32;
        self.outbox.send(format_args!(
            "{}:{},{},REL:{},{},MM:{},{}",
            event,
            self.h_axis.current_position,
            self.v_axis.current_position,
            rel_h,
            rel_v,
            mm_h,
            mm_v
        ));
    }

    // ===== tick work =====

    fn tick_work(&mut self) {
        // Limit supervision first: an abort must win over a retime
        let sample = self.limit_sense.sample();
        let edges = self.limits.poll(sample);
        for side in edges {
            self.handle_limit_trip(side);
        }

        // Profiler updates feed the pulse timers
        if self.h_axis.is_moving() {
            let speed = self.h_axis.profile.update(self.h_axis.current_position);
            if speed > 0 {
                self.h_axis.current_speed = speed;
                // A deferred write is retried by the next tick's update
                let _ = self.h_channel.retime(speed);
            }
        }
        if self.v_axis.is_moving() {
            let speed = self.v_axis.profile.update(self.v_axis.current_position);
            if speed > 0 {
                self.v_axis.current_speed = speed;
                let _ = self.v_channel.retime(speed);
            }
        }

        // Auxiliary actuators share the tick
        let now = self.now_ms();
        if let Ok(ServoUpdate::Completed) = self.servos.update(&mut self.servo_bank, now) {
            let (a1, a2) = self.servos.positions();
            self.outbox
                .send(format_args!("SERVO_MOVE_COMPLETED:{},{}", a1, a2));
            self.persist_actuators();
        }

        if let Ok(GripperUpdate::Completed(state)) = self.gripper.update(&mut self.coils) {
            self.outbox
                .send(format_args!("GRIPPER_ACTION_COMPLETED:{}", state.wire_name()));
            self.persist_actuators();
        }

        self.heartbeat_tick();
    }

    fn handle_limit_trip(&mut self, side: LimitSide) {
        self.outbox
            .send(format_args!("LIMIT_{}_TRIGGERED", side.wire_name()));

        // Abort the axis if it is travelling into the switch
        let (blocked_dir, is_horizontal) = match side {
            LimitSide::HMax => (Direction::Forward, true),
            LimitSide::HMin => (Direction::Reverse, true),
            LimitSide::VMax => (Direction::Forward, false),
            LimitSide::VMin => (Direction::Reverse, false),
        };

        if is_horizontal {
            if self.h_axis.is_moving() && self.h_axis.direction == blocked_dir {
                self.h_axis.abort(&mut self.h_channel);
            }
        } else if self.v_axis.is_moving() && self.v_axis.direction == blocked_dir {
            self.v_axis.abort(&mut self.v_channel);
        }

        self.outbox.send(format_args!(
            "POSITION_AT_LIMIT:H={},V={}",
            self.h_axis.current_position, self.v_axis.current_position
        ));

        if self.calibrating {
            let steps = if is_horizontal {
                (self.h_axis.current_position - self.cal_origin_h).unsigned_abs()
            } else {
                (self.v_axis.current_position - self.cal_origin_v).unsigned_abs()
            };
            self.outbox
                .send(format_args!("CALIBRATION_STEPS:{}", steps));
            self.calibrating = false;
        }
    }

    fn heartbeat_tick(&mut self) {
        if !self.heartbeat_enabled || !self.limits.state().any() {
            self.heartbeat_countdown = self.ticks_per_heartbeat;
            return;
        }

        self.heartbeat_countdown = self.heartbeat_countdown.saturating_sub(1);
        if self.heartbeat_countdown == 0 {
            self.heartbeat_countdown = self.ticks_per_heartbeat;
            self.send_limit_status();
        }
    }

    fn send_limit_status(&mut self) {
        let state = self.limits.state();
        self.outbox.send(format_args!(
            "LIMIT_STATUS:H_MIN={},H_MAX={},V_MIN={},V_MAX={}",
            state.h_min as u8, state.h_max as u8, state.v_min as u8, state.v_max as u8
        ));
    }

    // ===== calibration =====

    fn cmd_calibration_start(&mut self) {
        if self.is_moving() {
            self.outbox.send_str("ERR:BUSY:CS");
            return;
        }
        self.calibrating = true;
        self.cal_origin_h = self.h_axis.current_position;
        self.cal_origin_v = self.v_axis.current_position;
        self.outbox.send_str("OK:CALIBRATION_STARTED");
    }

    fn cmd_calibration_end(&mut self) {
        if self.calibrating {
            let steps_h = (self.h_axis.current_position - self.cal_origin_h).unsigned_abs();
            let steps_v = (self.v_axis.current_position - self.cal_origin_v).unsigned_abs();
            self.outbox
                .send(format_args!("CALIBRATION_STEPS:{}", steps_h.max(steps_v)));
        }
        self.calibrating = false;
        self.outbox.send_str("OK:CALIBRATION_STOPPED");
    }

    // ===== servo arm =====

    fn cmd_arm_move(&mut self, angle1: u8, angle2: u8, time_ms: u16) {
        let now = self.now_ms();
        match self
            .servos
            .move_to(&mut self.servo_bank, angle1, angle2, time_ms, now)
        {
            Ok((a1, a2, t)) => {
                if t == 0 {
                    self.persist_actuators();
                    self.outbox
                        .send(format_args!("OK:ARM_INSTANT:{},{}", a1, a2));
                } else {
                    self.outbox
                        .send(format_args!("SERVO_MOVE_STARTED:{},{},{}", a1, a2, t));
                    self.outbox
                        .send(format_args!("OK:ARM_SMOOTH:{},{},{}", a1, a2, t));
                }
            }
            Err(_) => self.outbox.send_str("ERR:DRIVER_FAULT:SERVO"),
        }
    }

    fn cmd_servo_set(&mut self, servo: u8, angle: u8) {
        let Some(id) = ServoId::from_number(servo) else {
            self.outbox.send_str("ERR:INVALID_SERVO_NUM");
            return;
        };

        match self.servos.set_position(&mut self.servo_bank, id, angle) {
            Ok(clamped) => {
                self.persist_actuators();
                self.outbox
                    .send(format_args!("OK:SERVO{}_POS:{}", id.number(), clamped));
            }
            Err(_) => self.outbox.send_str("ERR:DRIVER_FAULT:SERVO"),
        }
    }

    fn cmd_arms_reset(&mut self) {
        match self.servos.reset(&mut self.servo_bank) {
            Ok(()) => {
                self.persist_actuators();
                self.outbox.send_str("OK:ARMS_RESET");
            }
            Err(_) => self.outbox.send_str("ERR:DRIVER_FAULT:SERVO"),
        }
    }

    // ===== gripper =====

    fn cmd_gripper_open(&mut self) {
        if self.gripper.open() {
            self.outbox.send_str("GRIPPER_ACTION_STARTED:OPEN");
        }
        self.outbox.send_str("OK:GRIPPER_OPENING");
    }

    fn cmd_gripper_close(&mut self) {
        if self.gripper.close() {
            self.outbox.send_str("GRIPPER_ACTION_STARTED:CLOSE");
        }
        self.outbox.send_str("OK:GRIPPER_CLOSING");
    }

    fn cmd_gripper_toggle(&mut self) {
        use crate::actuators::GripperState;
        match self.gripper.toggle() {
            GripperState::Opening => {
                self.outbox.send_str("GRIPPER_ACTION_STARTED:OPEN");
                self.outbox.send_str("OK:GRIPPER_OPENING");
            }
            _ => {
                self.outbox.send_str("GRIPPER_ACTION_STARTED:CLOSE");
                self.outbox.send_str("OK:GRIPPER_CLOSING");
            }
        }
    }

    fn persist_actuators(&mut self) {
        use crate::actuators::GripperState;
        let (servo1, servo2) = self.servos.positions();
        persist::save(
            &mut self.store,
            &PersistedState {
                servo1,
                servo2,
                gripper_steps: self.gripper.position(),
                gripper_closed: self.gripper.state() == GripperState::Closed,
            },
        );
    }
}
